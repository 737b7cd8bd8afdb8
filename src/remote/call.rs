//! Typed remote calls.
//!
//! Each variant is one fully materialized request: ids are already
//! resolved, bodies already built. Mapping to HTTP happens here and
//! nowhere else.

use std::path::PathBuf;

use reqwest::Method;
use serde_json::{Value, json};

use crate::model::ResourceKind;

/// One authenticated request against the platform API.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Fetch a single record.
    Info { kind: ResourceKind, id: String },

    /// Remove a record.
    Delete { kind: ResourceKind, id: String },

    /// Stop something that is running: a run, session, or deployment.
    Stop { kind: ResourceKind, id: String },

    /// List a project's revisions.
    ProjectRevisions { project_id: String },

    /// Create a job from a project revision.
    CreateJob { project_id: String, body: Value },

    /// Start a run of an existing job.
    RunJob { job_id: String },

    /// Stop scheduling future runs of a job.
    PauseJob { job_id: String },

    /// Resume scheduling of a paused job.
    UnpauseJob { job_id: String },

    /// Change job parameters.
    PatchJob { job_id: String, body: Value },

    /// Deploy a project revision.
    Deploy { project_id: String, body: Value },

    /// Mint an access token for a private deployment.
    DeploymentToken { id: String },

    /// Create or overwrite a user secret.
    PutSecret { key: String, value: String },

    /// Create a project from an archive on disk. Sent as a multipart form,
    /// not JSON.
    UploadProject {
        archive: PathBuf,
        name: String,
        tag: Option<String>,
    },
}

impl Call {
    pub fn method(&self) -> Method {
        match self {
            Self::Info { .. } | Self::ProjectRevisions { .. } => Method::GET,
            Self::Delete { .. } => Method::DELETE,
            Self::Stop { kind, .. } => match kind {
                ResourceKind::Run => Method::POST,
                _ => Method::DELETE,
            },
            Self::PatchJob { .. } => Method::PATCH,
            Self::CreateJob { .. }
            | Self::RunJob { .. }
            | Self::PauseJob { .. }
            | Self::UnpauseJob { .. }
            | Self::Deploy { .. }
            | Self::DeploymentToken { .. }
            | Self::PutSecret { .. }
            | Self::UploadProject { .. } => Method::POST,
        }
    }

    /// Path relative to the API root.
    pub fn path(&self) -> String {
        match self {
            Self::Info { kind, id } | Self::Delete { kind, id } => {
                format!("{}/{id}", collection(*kind))
            }
            Self::Stop { kind, id } => match kind {
                ResourceKind::Run => format!("runs/{id}/stop"),
                _ => format!("{}/{id}", collection(*kind)),
            },
            Self::ProjectRevisions { project_id } => format!("projects/{project_id}/revisions"),
            Self::CreateJob { project_id, .. } => format!("projects/{project_id}/jobs"),
            Self::RunJob { job_id } => format!("jobs/{job_id}/runs"),
            Self::PauseJob { job_id } => format!("jobs/{job_id}/pause"),
            Self::UnpauseJob { job_id } => format!("jobs/{job_id}/unpause"),
            Self::PatchJob { job_id, .. } => format!("jobs/{job_id}"),
            Self::Deploy { project_id, .. } => format!("projects/{project_id}/deployments"),
            Self::DeploymentToken { id } => format!("deployments/{id}/token"),
            Self::PutSecret { .. } => collection(ResourceKind::Secret).to_string(),
            Self::UploadProject { .. } => "projects/actions?action=upload".to_string(),
        }
    }

    pub fn body(&self) -> Option<Value> {
        match self {
            Self::CreateJob { body, .. } | Self::PatchJob { body, .. } | Self::Deploy { body, .. } => {
                Some(body.clone())
            }
            Self::PutSecret { key, value } => Some(json!({ "key": key, "value": value })),
            _ => None,
        }
    }

    /// `(verb, resource)` for error context.
    pub fn describe(&self) -> (&'static str, String) {
        match self {
            Self::Info { kind, id } => ("fetch", format!("{kind} {id}")),
            Self::Delete { kind, id } => ("delete", format!("{kind} {id}")),
            Self::Stop { kind, id } => ("stop", format!("{kind} {id}")),
            Self::ProjectRevisions { project_id } => {
                ("list revisions of", format!("project {project_id}"))
            }
            Self::CreateJob { project_id, .. } => {
                ("create job for", format!("project {project_id}"))
            }
            Self::RunJob { job_id } => ("run", format!("job {job_id}")),
            Self::PauseJob { job_id } => ("pause", format!("job {job_id}")),
            Self::UnpauseJob { job_id } => ("unpause", format!("job {job_id}")),
            Self::PatchJob { job_id, .. } => ("patch", format!("job {job_id}")),
            Self::Deploy { project_id, .. } => ("deploy", format!("project {project_id}")),
            Self::DeploymentToken { id } => ("get token for", format!("deployment {id}")),
            Self::PutSecret { key, .. } => ("store", format!("secret {key}")),
            Self::UploadProject { name, .. } => ("upload", format!("project {name}")),
        }
    }

    /// `METHOD path`, for logs.
    pub fn label(&self) -> String {
        format!("{} {}", self.method(), self.path())
    }
}

/// The API collection a kind lives under.
pub fn collection(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Project => "projects",
        ResourceKind::Job => "jobs",
        ResourceKind::Run => "runs",
        ResourceKind::Session => "sessions",
        ResourceKind::Deployment => "deployments",
        ResourceKind::Secret => "credentials/user",
        ResourceKind::User => "users",
    }
}
