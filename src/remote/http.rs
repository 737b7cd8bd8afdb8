//! [`Remote`] over the platform's REST API.
//!
//! Platform resources live under `https://<host>/api/v2/`. Users come from
//! the identity realm's admin endpoint instead. Every request carries the
//! session's bearer token.

use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Record, ResourceKind};
use crate::session::Session;

use super::{Call, Remote, collection};

/// The identity realm that holds platform users.
const REALM: &str = "AnacondaPlatform";

/// Longest slice of an error body quoted back to the user.
const ERROR_BODY_LIMIT: usize = 300;

/// What a request carries.
enum Payload {
    Empty,
    Json(Value),
    Form(Form),
}

/// Blocking HTTP client bound to one session.
pub struct HttpRemote {
    client: Client,
    session: Session,
}

impl HttpRemote {
    pub fn new(session: Session, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ae5/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, session })
    }

    fn api_url(&self, path: &str) -> String {
        format!("https://{}/api/v2/{path}", self.session.hostname)
    }

    fn realm_url(&self, path: &str) -> String {
        format!(
            "https://{}/auth/admin/realms/{REALM}/{path}",
            self.session.hostname
        )
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
        action: &str,
        resource: &str,
    ) -> Result<Value> {
        let failed = |reason: String| Error::RemoteCallFailed {
            action: action.to_string(),
            resource: resource.to_string(),
            reason,
        };

        debug!(%method, url, "request");
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.session.token);
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Form(form) => request.multipart(form),
        };

        let response = request.send().map_err(|e| failed(transport_reason(&e)))?;
        let status = response.status();
        let text = response.text().map_err(|e| failed(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = text.len(), "response");

        if !status.is_success() {
            return Err(failed(format!("{status}: {}", error_detail(&text))));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| failed(format!("invalid JSON in response: {e}")))
    }
}

impl Remote for HttpRemote {
    fn list(&self, kind: ResourceKind, parent: Option<&str>) -> Result<Vec<Record>> {
        let url = match (kind, parent) {
            (ResourceKind::User, _) => self.realm_url("users"),
            (ResourceKind::Run, Some(job_id)) => self.api_url(&format!("jobs/{job_id}/runs")),
            (ResourceKind::Project, _) => self.api_url("projects?collaborators=true"),
            _ => self.api_url(collection(kind)),
        };
        let resource = match parent {
            Some(parent) => format!("{kind} records of {parent}"),
            None => format!("{kind} records"),
        };
        let value = self.send(Method::GET, &url, Payload::Empty, "list", &resource)?;
        Ok(shape(kind, value))
    }

    fn call(&self, call: &Call) -> Result<Value> {
        let (action, resource) = call.describe();
        let payload = match call {
            Call::UploadProject { archive, name, tag } => {
                let form = upload_form(archive, name, tag.as_deref()).map_err(|e| {
                    Error::RemoteCallFailed {
                        action: action.to_string(),
                        resource: resource.clone(),
                        reason: format!("cannot read {}: {e}", archive.display()),
                    }
                })?;
                Payload::Form(form)
            }
            _ => call.body().map_or(Payload::Empty, Payload::Json),
        };
        self.send(
            call.method(),
            &self.api_url(&call.path()),
            payload,
            action,
            &resource,
        )
    }
}

/// Normalizes a list response into records.
///
/// Collections may come bare or wrapped in `{"data": [...]}`. Secrets are
/// listed by name only, and users are named by `username`; both are given
/// `id` and `name` fields so resolution treats them like everything else.
fn shape(kind: ResourceKind, value: Value) -> Vec<Record> {
    match kind {
        ResourceKind::Secret => secret_names(value),
        ResourceKind::User => Record::list_from(value)
            .into_iter()
            .map(|mut user| {
                if user.name().is_none()
                    && let Some(username) = user.str("username").map(String::from)
                {
                    user.insert("name", username);
                }
                user
            })
            .collect(),
        _ => Record::list_from(value),
    }
}

/// The archive goes in `project_file`; name and tag ride along as text parts.
fn upload_form(archive: &Path, name: &str, tag: Option<&str>) -> io::Result<Form> {
    let mut form = Form::new().text("name", name.to_string());
    if let Some(tag) = tag {
        form = form.text("tag", tag.to_string());
    }
    form.file("project_file", archive)
}

fn secret_names(value: Value) -> Vec<Record> {
    let names = match value {
        Value::Object(mut wrapper) => wrapper.remove("data").unwrap_or_default(),
        other => other,
    };
    names
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(|key| {
            let mut fields = Map::new();
            fields.insert("id".to_string(), Value::String(key.to_string()));
            fields.insert("name".to_string(), Value::String(key.to_string()));
            Record::new(fields)
        })
        .collect()
}

fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

/// The most useful part of an error body: its `message`/`error` field if
/// it is JSON, otherwise the text itself, truncated.
fn error_detail(body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(Value::String(message)) = fields.get(key) {
                return message.clone();
            }
        }
    }
    let body = body.trim();
    if body.chars().count() > ERROR_BODY_LIMIT {
        let cut: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn unwraps_data_envelope() {
        let records = shape(ResourceKind::Job, json!({"data": [{"id": "j1"}, {"id": "j2"}]}));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn bare_arrays_pass_through() {
        let records = shape(ResourceKind::Run, json!([{"id": "r1"}]));
        assert_eq!(records[0].id(), Some("r1"));
    }

    #[test]
    fn secrets_become_named_records() {
        let records = shape(ResourceKind::Secret, json!({"data": ["AWS_KEY", "DB_PASS"]}));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), Some("AWS_KEY"));
        assert_eq!(records[0].name(), Some("AWS_KEY"));
    }

    #[test]
    fn users_are_named_by_username() {
        let records = shape(
            ResourceKind::User,
            json!([{"id": "9e9c", "username": "mock-ae-username"}]),
        );
        assert_eq!(records[0].name(), Some("mock-ae-username"));
        assert_eq!(records[0].id(), Some("9e9c"));
    }

    #[test]
    fn upload_form_needs_a_readable_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("proj.tar.gz");
        assert!(upload_form(&archive, "proj", None).is_err());

        std::fs::write(&archive, b"archive").unwrap();
        assert!(upload_form(&archive, "proj", Some("0.1.0")).is_ok());
    }

    #[test]
    fn error_detail_prefers_message_field() {
        assert_eq!(
            error_detail(r#"{"message": "job has an active run"}"#),
            "job has an active run"
        );
        assert_eq!(error_detail("  plain failure \n"), "plain failure");
    }

    #[test]
    fn error_detail_truncates_long_bodies() {
        let long = "x".repeat(ERROR_BODY_LIMIT + 50);
        let detail = error_detail(&long);
        assert!(detail.ends_with("..."));
        assert_eq!(detail.len(), ERROR_BODY_LIMIT + 3);
    }
}
