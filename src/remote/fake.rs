//! Scripted in-memory [`Remote`] for tests.
//!
//! Listings are fixed per `(kind, parent)`. Calls answer from a per-label
//! queue (`"POST jobs/j1/runs"`), falling back to `Null` once a queue is
//! empty. Every call is recorded by label, in order.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Record, ResourceKind};

use super::{Call, Remote};

#[derive(Default)]
pub struct FakeRemote {
    listings: HashMap<(ResourceKind, Option<String>), Vec<Record>>,
    responses: RefCell<HashMap<String, VecDeque<Result<Value>>>>,
    calls: RefCell<Vec<String>>,
    bodies: RefCell<Vec<Value>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` (a JSON array) when `kind` is listed.
    pub fn with_listing(mut self, kind: ResourceKind, records: Value) -> Self {
        self.listings.insert((kind, None), Record::list_from(records));
        self
    }

    /// Serve `records` when children of `parent` are listed.
    pub fn with_child_listing(mut self, kind: ResourceKind, parent: &str, records: Value) -> Self {
        self.listings
            .insert((kind, Some(parent.to_string())), Record::list_from(records));
        self
    }

    /// Queue a successful response for the call with this label.
    pub fn respond(self, label: &str, value: Value) -> Self {
        self.push(label, Ok(value));
        self
    }

    /// Queue a failure for the call with this label.
    pub fn fail(self, label: &str, reason: &str) -> Self {
        self.push(
            label,
            Err(Error::RemoteCallFailed {
                action: "call".to_string(),
                resource: label.to_string(),
                reason: reason.to_string(),
            }),
        );
        self
    }

    /// Labels of every call made so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Bodies of every call that carried one, in order.
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.borrow().clone()
    }

    fn push(&self, label: &str, response: Result<Value>) {
        self.responses
            .borrow_mut()
            .entry(label.to_string())
            .or_default()
            .push_back(response);
    }
}

impl Remote for FakeRemote {
    fn list(&self, kind: ResourceKind, parent: Option<&str>) -> Result<Vec<Record>> {
        Ok(self
            .listings
            .get(&(kind, parent.map(String::from)))
            .cloned()
            .unwrap_or_default())
    }

    fn call(&self, call: &Call) -> Result<Value> {
        let label = call.label();
        self.calls.borrow_mut().push(label.clone());
        if let Some(body) = call.body() {
            self.bodies.borrow_mut().push(body);
        }
        self.responses
            .borrow_mut()
            .get_mut(&label)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Value::Null))
    }
}
