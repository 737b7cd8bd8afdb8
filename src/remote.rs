//! The remote platform, as this client sees it.
//!
//! Two operations are consumed: listing records of a kind, and making one
//! typed call. [`HttpRemote`] is the real implementation; tests use a
//! scripted in-memory one.

mod call;
#[cfg(test)]
pub mod fake;
mod http;

use serde_json::Value;

use crate::error::Result;
use crate::model::{Record, ResourceKind};

pub use call::{Call, collection};
pub use http::HttpRemote;

/// The platform API.
pub trait Remote {
    /// A complete snapshot of the records of `kind` visible to the caller.
    ///
    /// `parent` narrows to children of one record; for runs it is a job id.
    fn list(&self, kind: ResourceKind, parent: Option<&str>) -> Result<Vec<Record>>;

    /// Perform one request. Responses with no body come back as `Null`.
    fn call(&self, call: &Call) -> Result<Value>;
}
