//! Records: opaque field maps returned by the remote service.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A single resource as the remote service reported it.
///
/// This layer never mutates what the service owns; it reads fields,
/// selects among records, and hands them back for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON object. Anything else is not a record.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Collects the objects of a JSON array, bare or wrapped as
    /// `{"data": [...]}`, skipping anything that isn't an object.
    pub fn list_from(value: Value) -> Vec<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut wrapper) => match wrapper.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        items.into_iter().filter_map(Self::from_value).collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// A string-valued field. Non-string values read as absent.
    pub fn str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.str("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.str("name")
    }

    pub fn owner(&self) -> Option<&str> {
        self.str("owner")
    }

    pub fn revision(&self) -> Option<&str> {
        self.str("revision")
    }

    pub fn state(&self) -> Option<&str> {
        self.str("state")
    }

    pub fn created(&self) -> Option<&str> {
        self.str("created")
    }

    /// The record's `id`, or an error naming what was in flight.
    pub fn require_id(&self, action: &str) -> Result<&str> {
        self.id().ok_or_else(|| Error::RemoteCallFailed {
            action: action.to_string(),
            resource: self.display_name(),
            reason: "record has no id".to_string(),
        })
    }

    /// Human-facing label: `owner/name:revision (id)`, with absent parts dropped.
    pub fn display_name(&self) -> String {
        let mut label = String::new();
        if let Some(owner) = self.owner() {
            label.push_str(owner);
            label.push('/');
        }
        label.push_str(self.name().or(self.id()).unwrap_or("?"));
        if let Some(revision) = self.revision() {
            label.push(':');
            label.push_str(revision);
        }
        if let (Some(id), Some(name)) = (self.id(), self.name())
            && name != id
        {
            let _ = write!(label, " ({id})");
        }
        label
    }

    /// Field rendered as plain text for tables: strings bare, null empty.
    pub fn text(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Fields available to message templates.
    ///
    /// Every scalar field is exposed under its own name, and `ident`
    /// carries the display label.
    pub fn template_fields(&self) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = self
            .0
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(k, _)| (k.clone(), self.text(k)))
            .collect();
        fields.insert("ident".to_string(), self.display_name());
        fields
    }

    /// This project record narrowed to one of its revisions.
    ///
    /// The revision's tag, creation time, source URL, and commands
    /// overlay the project's own fields; `id` stays the project's.
    pub fn with_revision(&self, revision: &Self) -> Self {
        let mut merged = self.clone();
        if let Some(tag) = revision.name() {
            merged.insert("revision", tag);
        }
        if let Some(id) = revision.id() {
            merged.insert("revision_id", id);
        }
        for field in ["created", "url", "commands"] {
            if let Some(value) = revision.get(field) {
                merged.insert(field, value.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn display_name_includes_owner_revision_and_id() {
        let r = record(json!({"id": "a1", "owner": "u1", "name": "proj", "revision": "0.1.0"}));
        assert_eq!(r.display_name(), "u1/proj:0.1.0 (a1)");
    }

    #[test]
    fn display_name_of_nameless_record_uses_id() {
        let r = record(json!({"id": "a1"}));
        assert_eq!(r.display_name(), "a1");
    }

    #[test]
    fn non_objects_are_not_records() {
        assert!(Record::from_value(json!("x")).is_none());
        assert_eq!(Record::list_from(json!([{"id": "a"}, 3, "b"])).len(), 1);
        assert!(Record::list_from(json!({"id": "a"})).is_empty());
    }

    #[test]
    fn listings_may_be_wrapped_in_data() {
        let records = Record::list_from(json!({"data": [{"id": "a"}, {"id": "b"}]}));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn text_renders_scalars_and_blanks_null() {
        let r = record(json!({"n": 3, "b": true, "s": "x", "z": null}));
        assert_eq!(r.text("n"), "3");
        assert_eq!(r.text("b"), "true");
        assert_eq!(r.text("s"), "x");
        assert_eq!(r.text("z"), "");
        assert_eq!(r.text("missing"), "");
    }

    #[test]
    fn with_revision_overlays_tag_but_keeps_project_id() {
        let project = record(json!({"id": "p1", "name": "proj", "created": "old"}));
        let revision = record(json!({
            "id": "r9",
            "name": "0.2.0",
            "created": "new",
            "url": "https://example/p1/0.2.0",
            "commands": [{"id": "run"}],
        }));

        let merged = project.with_revision(&revision);
        assert_eq!(merged.id(), Some("p1"));
        assert_eq!(merged.revision(), Some("0.2.0"));
        assert_eq!(merged.created(), Some("new"));
        assert_eq!(merged.str("revision_id"), Some("r9"));
        assert!(merged.get("commands").is_some());
    }

    #[test]
    fn template_fields_skip_nested_values() {
        let r = record(json!({"id": "a1", "name": "n", "commands": [1, 2]}));
        let fields = r.template_fields();
        assert_eq!(fields["name"], "n");
        assert_eq!(fields["ident"], "n (a1)");
        assert!(!fields.contains_key("commands"));
    }

    #[test]
    fn require_id_reports_missing_id() {
        let r = record(json!({"name": "n"}));
        let err = r.require_id("delete").unwrap_err();
        assert!(matches!(err, Error::RemoteCallFailed { .. }));
    }
}
