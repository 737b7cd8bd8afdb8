//! Action dispatch: resolve a target, confirm, call, and optionally wait.
//!
//! Every command flows through [`Dispatcher::dispatch`]:
//!
//! 1. List records of the target kind and resolve the identifier to one.
//!    Not-found and ambiguity fail here, before anything is sent.
//! 2. Render the confirmation prompt, if any. Declining is [`Error::Cancelled`].
//! 3. Print the prefix, make the call with the resolved id, print the postfix.
//! 4. If asked to, poll the resulting run until it reaches a terminal state.
//!
//! `job create --cleanup` is a composite: create, run, wait, delete the job.
//! If anything after the create fails, the job is deleted on a best-effort
//! basis before the original failure is returned.
//!
//! `job patch` reads the job, then writes the fields that differ. Nothing
//! stops a concurrent edit landing between the two, and it can be lost.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{Identifier, LATEST, Record, ResourceKind};
use crate::remote::{Call, Remote};
use crate::resolve::resolve;
use crate::template;
use crate::vars::Variables;

/// States after which a run will not change again.
pub const TERMINAL_STATES: &[&str] = &["completed", "failed", "stopped", "error"];

/// Resource profile used when neither the caller nor the project names one.
pub const DEFAULT_RESOURCE_PROFILE: &str = "default";

/// Asks the user to affirm a side effect.
pub trait Prompt {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Affirms everything; backs `--yes`.
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes` declines.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{question}? [y/N] ")?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// How long to wait for a run to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 100,
        }
    }
}

/// What to do once the target is resolved.
#[derive(Debug, Clone)]
pub enum Action {
    /// Return the resolved record.
    Info,
    /// List the runs of a job.
    Runs,
    /// List the revisions of a project.
    Revisions,
    Delete,
    Stop,
    /// Start a run of a job.
    Run,
    Pause,
    Unpause,
    /// Poll a run until it finishes.
    Wait,
    /// Mint a deployment access token.
    Token,
    Patch(JobPatch),
    CreateJob(JobSpec),
    Deploy(DeploySpec),
}

/// Options for `job create`.
#[derive(Debug, Clone, Default)]
pub struct JobSpec {
    pub name: Option<String>,
    pub make_unique: bool,
    pub command: Option<String>,
    pub schedule: Option<String>,
    pub resource_profile: Option<String>,
    pub variables: Variables,
    /// `None` picks the default: run-once jobs run, scheduled jobs don't.
    pub run: Option<bool>,
    pub show_run: bool,
    pub cleanup: bool,
}

/// What happens after a job is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunPlan {
    run: bool,
    wait: bool,
    show_run: bool,
    cleanup: bool,
}

impl JobSpec {
    fn plan(&self, wait: bool) -> Result<RunPlan> {
        if self.cleanup {
            if self.schedule.is_some() {
                return Err(Error::ConflictingOptions(
                    "--cleanup is only valid for run-once jobs; drop --schedule".to_string(),
                ));
            }
            if self.run == Some(false) {
                return Err(Error::ConflictingOptions(
                    "--cleanup runs the job; it cannot be combined with --no-run".to_string(),
                ));
            }
            return Ok(RunPlan {
                run: true,
                wait: true,
                show_run: true,
                cleanup: true,
            });
        }

        let run = self.run.unwrap_or(self.schedule.is_none());
        Ok(RunPlan {
            run,
            wait: run && wait,
            show_run: run && self.show_run,
            cleanup: false,
        })
    }
}

/// Options for `job patch`. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub name: Option<String>,
    pub command: Option<String>,
    pub schedule: Option<String>,
    pub resource_profile: Option<String>,
    pub variables: Variables,
}

/// Options for `project deploy`.
#[derive(Debug, Clone, Default)]
pub struct DeploySpec {
    pub name: Option<String>,
    pub command: Option<String>,
    pub resource_profile: Option<String>,
    pub public: bool,
    pub static_endpoint: Option<String>,
}

/// One command against one resource, built per invocation.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub kind: ResourceKind,
    pub action: Action,
    pub target: Identifier,
    /// Confirmation question; rendered against the resolved record.
    pub confirm: Option<String>,
    /// Printed to stderr before the call.
    pub prefix: Option<String>,
    /// Printed to stderr after a successful call.
    pub postfix: Option<String>,
    /// Poll the resulting run until it finishes.
    pub wait: bool,
}

impl ActionRequest {
    pub fn new(kind: ResourceKind, target: Identifier, action: Action) -> Self {
        Self {
            kind,
            action,
            target,
            confirm: None,
            prefix: None,
            postfix: None,
            wait: false,
        }
    }

    #[must_use]
    pub fn confirm(mut self, template: &str) -> Self {
        self.confirm = Some(template.to_string());
        self
    }

    #[must_use]
    pub fn prefix(mut self, template: &str) -> Self {
        self.prefix = Some(template.to_string());
        self
    }

    #[must_use]
    pub fn postfix(mut self, template: &str) -> Self {
        self.postfix = Some(template.to_string());
        self
    }

    #[must_use]
    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// The confirmation question and status text, rendered against the
    /// resolved record's fields.
    fn rendered(&self, fields: &BTreeMap<String, String>) -> Rendered {
        let render = |t: Option<&String>| t.map(|t| template::render(t, fields));
        Rendered {
            confirm: render(self.confirm.as_ref()),
            prefix: render(self.prefix.as_ref()),
            postfix: render(self.postfix.as_ref()),
        }
    }

    /// Whether the action acts on one revision rather than the whole project.
    fn uses_revision(&self) -> bool {
        matches!(
            self.action,
            Action::Info | Action::CreateJob(_) | Action::Deploy(_)
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Rendered {
    confirm: Option<String>,
    prefix: Option<String>,
    postfix: Option<String>,
}

/// What a dispatched command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    One(Record),
    Many(Vec<Record>),
}

impl Outcome {
    /// The single record, or an error when the action produced a listing.
    pub fn into_record(self) -> Result<Record> {
        match self {
            Self::One(record) => Ok(record),
            Self::Many(records) => Err(Error::InvalidRequest(format!(
                "expected one record, got {}",
                records.len()
            ))),
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::One(record) => vec![record],
            Self::Many(records) => records,
        }
    }
}

/// Runs [`ActionRequest`]s against a remote.
pub struct Dispatcher<'a> {
    remote: &'a dyn Remote,
    prompt: &'a dyn Prompt,
    wait: WaitPolicy,
}

impl<'a> Dispatcher<'a> {
    pub fn new(remote: &'a dyn Remote, prompt: &'a dyn Prompt, wait: WaitPolicy) -> Self {
        Self {
            remote,
            prompt,
            wait,
        }
    }

    pub fn remote(&self) -> &'a dyn Remote {
        self.remote
    }

    pub fn dispatch(&self, request: &ActionRequest) -> Result<Outcome> {
        let target = self.target(request)?;

        match &request.action {
            Action::Info => Ok(Outcome::One(target)),
            Action::Runs => {
                let job_id = target.require_id("list runs of")?;
                Ok(Outcome::Many(
                    self.remote.list(ResourceKind::Run, Some(job_id))?,
                ))
            }
            Action::Revisions => {
                let project_id = target.require_id("list revisions of")?.to_string();
                let value = self.remote.call(&Call::ProjectRevisions { project_id })?;
                Ok(Outcome::Many(Record::list_from(value)))
            }
            Action::Wait => Ok(Outcome::One(self.wait_for_run(&target)?)),
            Action::Patch(patch) => self.patch_job(request, target, patch),
            Action::CreateJob(spec) => self.create_job(request, &target, spec),
            Action::Deploy(spec) => self.deploy(request, &target, spec),
            Action::Delete
            | Action::Stop
            | Action::Run
            | Action::Pause
            | Action::Unpause
            | Action::Token => self.perform(request, &target),
        }
    }

    /// Resolves the request's identifier to one record.
    ///
    /// Projects resolve in two stages: the project by owner/name/id, then
    /// one of its revisions when the action needs one.
    fn target(&self, request: &ActionRequest) -> Result<Record> {
        let ident = &request.target;
        let records = self.remote.list(request.kind, None)?;
        let record = resolve(&ident.without_revision(), &records, request.kind)?.clone();

        if !request.kind.has_revisions() {
            return Ok(record);
        }
        if !request.uses_revision() {
            if ident.revision().is_some() {
                return Err(Error::InvalidRequest(format!(
                    "'{ident}' names a revision, but this command acts on the whole project"
                )));
            }
            return Ok(record);
        }
        // Omitted and `latest` revisions are the same selector. A project
        // with no revisions yet can still be shown.
        match self.revision_of(&record, ident) {
            Err(Error::NotFound { .. })
                if matches!(request.action, Action::Info) && ident.wants_latest() =>
            {
                Ok(record)
            }
            other => other,
        }
    }

    fn revision_of(&self, project: &Record, ident: &Identifier) -> Result<Record> {
        let project_id = project.require_id("list revisions of")?.to_string();
        let value = self.remote.call(&Call::ProjectRevisions { project_id })?;
        let revisions: Vec<Record> = Record::list_from(value)
            .iter()
            .map(|revision| project.with_revision(revision))
            .collect();
        resolve(ident, &revisions, ResourceKind::Project).cloned()
    }

    /// Single-call actions: confirm, call with the resolved id, maybe wait.
    fn perform(&self, request: &ActionRequest, target: &Record) -> Result<Outcome> {
        let id = target.require_id("act on")?.to_string();
        let kind = request.kind;
        let call = match request.action {
            Action::Delete => Call::Delete { kind, id },
            Action::Stop => Call::Stop { kind, id },
            Action::Run => Call::RunJob { job_id: id },
            Action::Pause => Call::PauseJob { job_id: id },
            Action::Unpause => Call::UnpauseJob { job_id: id },
            Action::Token => Call::DeploymentToken { id },
            _ => {
                return Err(Error::InvalidRequest(format!(
                    "{:?} is not a single-call action",
                    request.action
                )));
            }
        };

        let value = self.guarded(request, &target.template_fields(), &call)?;
        if matches!(request.action, Action::Run) {
            let run = expect_record(value, "run", &format!("job {}", target.display_name()))?;
            if request.wait {
                return Ok(Outcome::One(self.wait_for_run(&run)?));
            }
            return Ok(Outcome::One(run));
        }
        Ok(Outcome::One(
            Record::from_value(value).unwrap_or_else(|| target.clone()),
        ))
    }

    /// Confirmation, status text, and the call itself.
    fn guarded(
        &self,
        request: &ActionRequest,
        fields: &BTreeMap<String, String>,
        call: &Call,
    ) -> Result<Value> {
        let text = request.rendered(fields);
        if let Some(question) = &text.confirm
            && !self.prompt.confirm(question)?
        {
            info!(%question, "declined");
            return Err(Error::Cancelled);
        }

        if let Some(prefix) = &text.prefix {
            eprint!("{prefix} ");
        }

        let value = match self.remote.call(call) {
            Ok(value) => value,
            Err(e) => {
                if text.prefix.is_some() {
                    eprintln!("failed.");
                }
                return Err(e);
            }
        };

        match &text.postfix {
            Some(postfix) => eprintln!("{postfix}"),
            None if text.prefix.is_some() => eprintln!(),
            None => {}
        }
        Ok(value)
    }

    fn wait_for_run(&self, run: &Record) -> Result<Record> {
        let id = run.require_id("wait for")?.to_string();
        let resource = format!("run {}", run.display_name());
        poll_until_terminal(self.wait, &resource, || {
            let value = self.remote.call(&Call::Info {
                kind: ResourceKind::Run,
                id: id.clone(),
            })?;
            expect_record(value, "fetch", &format!("run {id}"))
        })
    }

    fn create_job(
        &self,
        request: &ActionRequest,
        revision: &Record,
        spec: &JobSpec,
    ) -> Result<Outcome> {
        let plan = spec.plan(request.wait)?;
        let project_id = revision.require_id("create job for")?.to_string();

        let command = match &spec.command {
            Some(command) => command.clone(),
            None => command_ids(revision).into_iter().next().ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "{} defines no commands; pass --command",
                    revision.display_name()
                ))
            })?,
        };
        let resource_profile = resource_profile(spec.resource_profile.as_deref(), revision);
        let name = self.job_name(spec, revision, &command)?;

        // `latest` stays symbolic so the job tracks new revisions.
        let revision_tag = if request.target.wants_latest() {
            LATEST
        } else {
            revision.revision().unwrap_or(LATEST)
        };

        let mut body = json!({
            "name": name,
            "source": revision.str("url"),
            "revision": revision_tag,
            "command": command,
            "resource_profile": resource_profile,
            "schedule": spec.schedule,
            "target": "deploy",
            "autorun": false,
        });
        if let Some(variables) = &spec.variables
            && !variables.is_empty()
        {
            body["variables"] = json!(variables);
        }

        let mut fields = revision.template_fields();
        fields.insert("job_name".to_string(), name.clone());
        let value = self.guarded(request, &fields, &Call::CreateJob { project_id, body })?;
        let job = expect_record(value, "create", &format!("job {name}"))?;

        if !plan.run {
            return Ok(Outcome::One(job));
        }

        match self.follow(&job, plan) {
            Ok(run) if plan.show_run => Ok(Outcome::One(run)),
            Ok(_) => Ok(Outcome::One(job)),
            Err(e) if plan.cleanup => Err(self.compensate(&job, e)),
            Err(e) => Err(e),
        }
    }

    /// Steps after create: run, wait, delete the job.
    fn follow(&self, job: &Record, plan: RunPlan) -> Result<Record> {
        let job_id = job.require_id("run")?.to_string();

        let value = self.remote.call(&Call::RunJob {
            job_id: job_id.clone(),
        })?;
        let run = expect_record(value, "run", &format!("job {}", job.display_name()))?;
        let run = if plan.wait {
            self.wait_for_run(&run)?
        } else {
            run
        };

        if plan.cleanup {
            self.remote.call(&Call::Delete {
                kind: ResourceKind::Job,
                id: job_id,
            })?;
            info!(job = %job.display_name(), "removed job after its run");
        }
        Ok(run)
    }

    /// Best-effort removal of a job whose composite failed part way.
    fn compensate(&self, job: &Record, original: Error) -> Error {
        let Some(id) = job.id() else {
            return original;
        };
        warn!(job = %job.display_name(), error = %original, "removing job after failure");

        match self.remote.call(&Call::Delete {
            kind: ResourceKind::Job,
            id: id.to_string(),
        }) {
            Ok(_) => original,
            Err(compensation) => Error::CompensationFailed {
                resource: format!("job {}", job.display_name()),
                original: Box::new(original),
                compensation: Box::new(compensation),
            },
        }
    }

    /// The new job's name: the one given, or `<project>-<command>`, made
    /// unique against existing job and run names when allowed.
    fn job_name(&self, spec: &JobSpec, project: &Record, command: &str) -> Result<String> {
        let (base, make_unique) = match &spec.name {
            Some(name) => (name.clone(), spec.make_unique),
            None => (
                format!("{}-{command}", project.name().unwrap_or("job")),
                true,
            ),
        };

        let mut taken = HashSet::new();
        for kind in [ResourceKind::Job, ResourceKind::Run] {
            taken.extend(
                self.remote
                    .list(kind, None)?
                    .iter()
                    .filter_map(Record::name)
                    .map(String::from),
            );
        }
        unique_name(base, &taken, make_unique)
    }

    fn patch_job(&self, request: &ActionRequest, job: Record, patch: &JobPatch) -> Result<Outcome> {
        let job_id = job.require_id("patch")?.to_string();

        let mut body = Map::new();
        for (field, value) in [
            ("name", &patch.name),
            ("command", &patch.command),
            ("schedule", &patch.schedule),
            ("resource_profile", &patch.resource_profile),
        ] {
            if let Some(value) = value
                && job.str(field) != Some(value.as_str())
            {
                body.insert(field.to_string(), Value::String(value.clone()));
            }
        }
        if let Some(variables) = &patch.variables {
            let wanted = json!(variables);
            let current = job
                .get("variables")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| json!({}));
            if current != wanted {
                body.insert("variables".to_string(), wanted);
            }
        }

        if body.is_empty() {
            info!(job = %job.display_name(), "nothing to change");
            return Ok(Outcome::One(job));
        }

        if let Some(Value::String(name)) = body.get("name") {
            let jobs = self.remote.list(ResourceKind::Job, None)?;
            if jobs
                .iter()
                .any(|j| j.name() == Some(name.as_str()) && j.id() != Some(job_id.as_str()))
            {
                return Err(Error::ConflictingOptions(format!(
                    "a job named '{name}' already exists"
                )));
            }
        }

        self.guarded(
            request,
            &job.template_fields(),
            &Call::PatchJob {
                job_id: job_id.clone(),
                body: Value::Object(body),
            },
        )?;

        // The patch response is not guaranteed to be the whole record.
        let value = self.remote.call(&Call::Info {
            kind: ResourceKind::Job,
            id: job_id,
        })?;
        Ok(Outcome::One(Record::from_value(value).unwrap_or(job)))
    }

    fn deploy(
        &self,
        request: &ActionRequest,
        revision: &Record,
        spec: &DeploySpec,
    ) -> Result<Outcome> {
        let project_id = revision.require_id("deploy")?.to_string();

        let commands = command_ids(revision);
        let command = match &spec.command {
            Some(command) => command.clone(),
            None => commands.first().cloned().ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "{} defines no commands to deploy",
                    revision.display_name()
                ))
            })?,
        };
        if !commands.contains(&command) {
            return Err(Error::InvalidRequest(format!(
                "command '{command}' is not defined by {}; available: {}",
                revision.display_name(),
                commands.join(", ")
            )));
        }

        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| revision.name().unwrap_or("deployment").to_string());
        let body = json!({
            "name": name,
            "source": revision.str("url"),
            "revision": revision.revision(),
            "resource_profile": resource_profile(spec.resource_profile.as_deref(), revision),
            "command": command,
            "public": spec.public,
            "static_endpoint": spec.static_endpoint,
            "target": "deploy",
        });

        let mut fields = revision.template_fields();
        fields.insert("deployment_name".to_string(), name.clone());
        let value = self.guarded(request, &fields, &Call::Deploy { project_id, body })?;
        Ok(Outcome::One(expect_record(
            value,
            "deploy",
            &format!("deployment {name}"),
        )?))
    }
}

/// Polls until the record reaches a terminal state or attempts run out.
///
/// Running out is a [`Error::Timeout`] carrying the last state seen, never
/// a success. A terminal state other than `completed` is still returned;
/// the record says how it ended.
pub fn poll_until_terminal(
    policy: WaitPolicy,
    resource: &str,
    mut poll: impl FnMut() -> Result<Record>,
) -> Result<Record> {
    let mut last_state = String::from("unknown");

    for attempt in 1..=policy.max_attempts {
        let record = poll()?;
        let state = record.state().unwrap_or("unknown");
        info!(resource, attempt, state, "polled");

        if TERMINAL_STATES.contains(&state) {
            if state != "completed" {
                warn!(resource, state, "finished without completing");
            }
            return Ok(record);
        }

        last_state = state.to_string();
        if attempt < policy.max_attempts {
            thread::sleep(policy.interval);
        }
    }

    Err(Error::Timeout {
        resource: resource.to_string(),
        attempts: policy.max_attempts,
        last_state,
    })
}

fn unique_name(base: String, taken: &HashSet<String>, make_unique: bool) -> Result<String> {
    if !taken.contains(&base) {
        return Ok(base);
    }
    if !make_unique {
        return Err(Error::ConflictingOptions(format!(
            "a job or run named '{base}' already exists; pass --make-unique to add a counter"
        )));
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Command ids a revision defines, in declaration order.
fn command_ids(revision: &Record) -> Vec<String> {
    revision
        .get("commands")
        .and_then(Value::as_array)
        .map(|commands| {
            commands
                .iter()
                .filter_map(|c| c.get("id").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn resource_profile(explicit: Option<&str>, project: &Record) -> String {
    explicit
        .or_else(|| project.str("resource_profile"))
        .unwrap_or(DEFAULT_RESOURCE_PROFILE)
        .to_string()
}

fn expect_record(value: Value, action: &str, resource: &str) -> Result<Record> {
    Record::from_value(value).ok_or_else(|| Error::RemoteCallFailed {
        action: action.to_string(),
        resource: resource.to_string(),
        reason: "response was not a record".to_string(),
    })
}
