//! The command surface as plain functions.
//!
//! One method per action. Each builds an [`ActionRequest`] with the
//! confirmation and status templates that action uses, then hands it to the
//! [`Dispatcher`]. Listing is the exception: it filters a snapshot locally
//! and never calls anything.

use std::collections::BTreeMap;
use std::path::Path;

use crate::dispatch::{Action, ActionRequest, DeploySpec, Dispatcher, JobPatch, JobSpec};
use crate::error::{Error, Result};
use crate::model::{Identifier, Record, ResourceKind};
use crate::remote::Call;
use crate::resolve::{filter, matching};

pub struct Api<'a> {
    dispatcher: Dispatcher<'a>,
}

impl<'a> Api<'a> {
    pub fn new(dispatcher: Dispatcher<'a>) -> Self {
        Self { dispatcher }
    }

    // ── Any kind ──

    /// Records of `kind`, narrowed by an optional identifier pattern and
    /// `field -> glob` filters. Zero matches is an empty list, not an error.
    ///
    /// Listings hold whole projects, so a pattern naming a revision is
    /// rejected; `project revisions` lists those.
    pub fn list(
        &self,
        kind: ResourceKind,
        pattern: Option<&str>,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Record>> {
        let pattern = pattern.map(|raw| Identifier::parse(raw, kind)).transpose()?;
        if let Some(ident) = &pattern
            && ident.revision().is_some()
        {
            return Err(Error::InvalidRequest(format!(
                "'{ident}' names a revision; list revisions with `project revisions`"
            )));
        }

        let records = self.dispatcher.remote().list(kind, None)?;
        let matched = match &pattern {
            Some(ident) => matching(ident, &records),
            None => records.iter().collect(),
        };
        Ok(filter(matched, filters).into_iter().cloned().collect())
    }

    pub fn info(&self, kind: ResourceKind, ident: &str) -> Result<Record> {
        self.one(kind, ident, Action::Info, |request| request)
    }

    pub fn delete(&self, kind: ResourceKind, ident: &str) -> Result<Record> {
        self.one(kind, ident, Action::Delete, |request| {
            request
                .confirm(&format!("Delete {kind} {{ident}}"))
                .prefix(&format!("Deleting {kind} {{ident}}..."))
                .postfix("deleted.")
        })
    }

    /// Stops a run, session, or deployment.
    pub fn stop(&self, kind: ResourceKind, ident: &str) -> Result<Record> {
        self.one(kind, ident, Action::Stop, |request| {
            request
                .confirm(&format!("Stop {kind} {{ident}}"))
                .prefix(&format!("Stopping {kind} {{ident}}..."))
                .postfix("stopped.")
        })
    }

    // ── Jobs ──

    /// Creates a job from a project revision (`owner/name:revision`).
    ///
    /// Returns the job, or its run when the run is shown.
    pub fn job_create(&self, project: &str, spec: JobSpec, wait: bool) -> Result<Record> {
        self.one(ResourceKind::Project, project, Action::CreateJob(spec), |request| {
            request
                .prefix("Creating job {job_name} for {ident}...")
                .postfix("created.")
                .wait(wait)
        })
    }

    /// Starts a run; with `wait`, returns the run once it finishes.
    pub fn job_run(&self, job: &str, wait: bool) -> Result<Record> {
        self.one(ResourceKind::Job, job, Action::Run, |request| {
            request
                .prefix("Starting a run of job {ident}...")
                .postfix("started.")
                .wait(wait)
        })
    }

    pub fn job_pause(&self, job: &str) -> Result<Record> {
        self.one(ResourceKind::Job, job, Action::Pause, |request| {
            request
                .prefix("Pausing job {ident}...")
                .postfix("paused.")
        })
    }

    pub fn job_unpause(&self, job: &str) -> Result<Record> {
        self.one(ResourceKind::Job, job, Action::Unpause, |request| {
            request
                .prefix("Unpausing job {ident}...")
                .postfix("unpaused.")
        })
    }

    pub fn job_patch(&self, job: &str, patch: JobPatch) -> Result<Record> {
        self.one(ResourceKind::Job, job, Action::Patch(patch), |request| {
            request
                .prefix("Updating job {ident}...")
                .postfix("updated.")
        })
    }

    pub fn job_runs(&self, job: &str) -> Result<Vec<Record>> {
        self.many(ResourceKind::Job, job, Action::Runs)
    }

    // ── Projects ──

    pub fn project_revisions(&self, project: &str) -> Result<Vec<Record>> {
        self.many(ResourceKind::Project, project, Action::Revisions)
    }

    /// Creates a project from an archive. `name` defaults to the archive's
    /// file name up to its first `.`.
    pub fn project_upload(
        &self,
        archive: &Path,
        name: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Record> {
        if !archive.is_file() {
            return Err(Error::InvalidRequest(format!(
                "{} is not a file",
                archive.display()
            )));
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => archive_stem(archive).ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "cannot derive a project name from {}; pass --name",
                    archive.display()
                ))
            })?,
        };

        let value = self.dispatcher.remote().call(&Call::UploadProject {
            archive: archive.to_path_buf(),
            name: name.clone(),
            tag: tag.map(String::from),
        })?;
        Record::from_value(value).ok_or_else(|| Error::RemoteCallFailed {
            action: "upload".to_string(),
            resource: format!("project {name}"),
            reason: "response was not a record".to_string(),
        })
    }

    pub fn project_deploy(&self, project: &str, spec: DeploySpec) -> Result<Record> {
        self.one(ResourceKind::Project, project, Action::Deploy(spec), |request| {
            request
                .prefix("Starting deployment {deployment_name} of {ident}...")
                .postfix("started.")
        })
    }

    // ── Runs ──

    /// Polls a run until it reaches a terminal state.
    pub fn run_wait(&self, run: &str) -> Result<Record> {
        self.one(ResourceKind::Run, run, Action::Wait, |request| request)
    }

    // ── Deployments ──

    pub fn deployment_token(&self, deployment: &str) -> Result<Record> {
        self.one(ResourceKind::Deployment, deployment, Action::Token, |request| request)
    }

    // ── Secrets ──

    /// Stores a secret, overwriting any existing value under `key`.
    pub fn secret_add(&self, key: &str, value: &str) -> Result<Record> {
        self.dispatcher.remote().call(&Call::PutSecret {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        let mut record = Record::default();
        record.insert("id", key);
        record.insert("name", key);
        Ok(record)
    }

    /// Removes a secret by exact key. An absent key is [`crate::error::Error::NotFound`].
    pub fn secret_delete(&self, key: &str) -> Result<Record> {
        let request = ActionRequest::new(
            ResourceKind::Secret,
            Identifier::from_id(key),
            Action::Delete,
        )
        .confirm("Delete secret {ident}")
        .prefix("Deleting secret {ident}...")
        .postfix("deleted.");
        self.dispatcher.dispatch(&request)?.into_record()
    }

    // ── Plumbing ──

    fn one(
        &self,
        kind: ResourceKind,
        raw: &str,
        action: Action,
        build: impl FnOnce(ActionRequest) -> ActionRequest,
    ) -> Result<Record> {
        let request = build(ActionRequest::new(kind, Identifier::parse(raw, kind)?, action));
        self.dispatcher.dispatch(&request)?.into_record()
    }

    fn many(&self, kind: ResourceKind, raw: &str, action: Action) -> Result<Vec<Record>> {
        let request = ActionRequest::new(kind, Identifier::parse(raw, kind)?, action);
        Ok(self.dispatcher.dispatch(&request)?.into_records())
    }
}

/// `proj.tar.gz` -> `proj`.
fn archive_stem(archive: &Path) -> Option<String> {
    let file_name = archive.file_name()?.to_str()?;
    let stem = file_name.split('.').next()?;
    (!stem.is_empty()).then(|| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::dispatch::{AssumeYes, WaitPolicy};
    use crate::remote::fake::FakeRemote;

    fn sessions() -> FakeRemote {
        FakeRemote::new().with_listing(
            ResourceKind::Session,
            json!([
                {"id": "s1", "owner": "u1", "name": "explore", "state": "started"},
                {"id": "s2", "owner": "u2", "name": "explore", "state": "stopped"},
                {"id": "s3", "owner": "u1", "name": "train", "state": "started"},
            ]),
        )
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(Record::id).collect()
    }

    #[test]
    fn list_applies_pattern_then_filters() {
        let remote = sessions();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let all = api.list(ResourceKind::Session, None, &BTreeMap::new()).unwrap();
        assert_eq!(ids(&all), ["s1", "s2", "s3"]);

        let named = api
            .list(ResourceKind::Session, Some("explore"), &BTreeMap::new())
            .unwrap();
        assert_eq!(ids(&named), ["s1", "s2"]);

        let filters = BTreeMap::from([("state".to_string(), "start*".to_string())]);
        let started = api
            .list(ResourceKind::Session, Some("u1/*"), &filters)
            .unwrap();
        assert_eq!(ids(&started), ["s1", "s3"]);
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn list_with_no_match_is_empty() {
        let remote = sessions();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));
        let none = api
            .list(ResourceKind::Session, Some("nothing*"), &BTreeMap::new())
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn list_rejects_a_revision_pattern() {
        let remote = FakeRemote::new();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));
        let err = api
            .list(ResourceKind::Project, Some("proj:0.1.0"), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn project_info_treats_omitted_revision_as_latest() {
        let remote = FakeRemote::new()
            .with_listing(
                ResourceKind::Project,
                json!([{"id": "p1", "owner": "u1", "name": "proj"}]),
            )
            .respond(
                "GET projects/p1/revisions",
                json!([
                    {"id": "rv1", "name": "0.1.0", "created": "2024-01-01T00:00:00Z"},
                    {"id": "rv2", "name": "0.2.0", "created": "2024-02-01T00:00:00Z"},
                ]),
            )
            .respond(
                "GET projects/p1/revisions",
                json!([
                    {"id": "rv1", "name": "0.1.0", "created": "2024-01-01T00:00:00Z"},
                    {"id": "rv2", "name": "0.2.0", "created": "2024-02-01T00:00:00Z"},
                ]),
            );
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let bare = api.info(ResourceKind::Project, "proj").unwrap();
        let latest = api.info(ResourceKind::Project, "proj:latest").unwrap();
        assert_eq!(bare, latest);
        assert_eq!(bare.revision(), Some("0.2.0"));
    }

    #[test]
    fn project_upload_names_the_project_after_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("proj.tar.gz");
        std::fs::write(&archive, b"archive").unwrap();
        let remote = FakeRemote::new().respond(
            "POST projects/actions?action=upload",
            json!({"id": "p9", "name": "proj"}),
        );
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let project = api.project_upload(&archive, None, Some("0.1.0")).unwrap();
        assert_eq!(project.id(), Some("p9"));
        assert_eq!(remote.calls(), ["POST projects/actions?action=upload"]);
    }

    #[test]
    fn project_upload_of_missing_archive_makes_no_call() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FakeRemote::new();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let err = api
            .project_upload(&dir.path().join("missing.tar.gz"), Some("proj"), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn archive_stem_drops_every_extension() {
        assert_eq!(archive_stem(Path::new("/tmp/proj.tar.gz")).as_deref(), Some("proj"));
        assert_eq!(archive_stem(Path::new(".hidden")), None);
    }

    #[test]
    fn stop_uses_the_resolved_id() {
        let remote = sessions();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));
        api.stop(ResourceKind::Session, "u1/train").unwrap();
        assert_eq!(remote.calls(), ["DELETE sessions/s3"]);
    }

    #[test]
    fn secret_add_posts_key_and_value() {
        let remote = FakeRemote::new();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let record = api.secret_add("DB_PASS", "hunter2").unwrap();
        assert_eq!(record.name(), Some("DB_PASS"));
        assert_eq!(remote.calls(), ["POST credentials/user"]);
        assert_eq!(remote.bodies()[0], json!({"key": "DB_PASS", "value": "hunter2"}));
    }

    #[test]
    fn secret_delete_of_absent_key_is_not_found() {
        let remote = FakeRemote::new().with_listing(
            ResourceKind::Secret,
            json!([{"id": "AWS_KEY", "name": "AWS_KEY"}]),
        );
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let err = api.secret_delete("DB_PASS").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(remote.calls().is_empty());

        api.secret_delete("AWS_KEY").unwrap();
        assert_eq!(remote.calls(), ["DELETE credentials/user/AWS_KEY"]);
    }

    #[test]
    fn secret_delete_does_not_glob_the_key() {
        let remote = FakeRemote::new().with_listing(
            ResourceKind::Secret,
            json!([{"id": "DB_PASS", "name": "DB_PASS"}]),
        );
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));

        let err = api.secret_delete("DB_*").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref ident, .. } if ident == "DB_*"));
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn malformed_identifier_fails_before_listing() {
        let remote = sessions();
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));
        let err = api.info(ResourceKind::Session, "a/b/c").unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }

    #[test]
    fn job_runs_lists_children() {
        let remote = FakeRemote::new()
            .with_listing(ResourceKind::Job, json!([{"id": "j1", "name": "nightly"}]))
            .with_child_listing(ResourceKind::Run, "j1", json!([{"id": "r1"}]));
        let api = Api::new(Dispatcher::new(&remote, &AssumeYes, WaitPolicy::default()));
        assert_eq!(ids(&api.job_runs("nightly").unwrap()), ["r1"]);
    }
}
