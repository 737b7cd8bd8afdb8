//! Failures surfaced to the command line.
//!
//! Local failures (identifier, resolution, option errors) are deterministic
//! and never retried. Remote failures carry the action and resource that
//! were in flight.

use std::fmt::Write as _;
use std::io;

use crate::model::{Record, ResourceKind};

/// How many candidates an ambiguity message lists before summarizing.
pub const AMBIGUOUS_DISPLAY_CAP: usize = 10;

/// Errors that can occur while resolving or dispatching a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed identifier '{input}': {reason}")]
    MalformedIdentifier { input: String, reason: String },

    #[error("no {kind} found matching '{ident}'")]
    NotFound { kind: ResourceKind, ident: String },

    #[error("{}", ambiguous_message(.kind, .ident, .candidates))]
    Ambiguous {
        kind: ResourceKind,
        ident: String,
        candidates: Vec<Record>,
    },

    #[error("{0}")]
    ConflictingOptions(String),

    #[error("one or more key=value options are invalid:{}", bullets(.0))]
    MalformedVariable(Vec<String>),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{action} {resource} failed: {reason}")]
    RemoteCallFailed {
        action: String,
        resource: String,
        reason: String,
    },

    #[error("gave up on {resource} after {attempts} polls; last state: {last_state}")]
    Timeout {
        resource: String,
        attempts: u32,
        last_state: String,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("{original}\nremoving {resource} afterwards also failed: {compensation}")]
    CompensationFailed {
        resource: String,
        original: Box<Error>,
        compensation: Box<Error>,
    },

    #[error("{0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Process exit code for this failure.
    ///
    /// A declined confirmation exits 3 so scripts can tell it apart from
    /// both success and failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Cancelled => 3,
            _ => 1,
        }
    }
}

fn ambiguous_message(kind: &ResourceKind, ident: &str, candidates: &[Record]) -> String {
    let mut message = format!(
        "'{ident}' is ambiguous: matches {} {kind} records",
        candidates.len()
    );
    for candidate in candidates.iter().take(AMBIGUOUS_DISPLAY_CAP) {
        message.push_str("\n  - ");
        message.push_str(&candidate.display_name());
    }
    if candidates.len() > AMBIGUOUS_DISPLAY_CAP {
        let _ = write!(
            message,
            "\n  ... and {} more",
            candidates.len() - AMBIGUOUS_DISPLAY_CAP
        );
    }
    message
}

fn bullets(items: &[String]) -> String {
    items.iter().map(|item| format!("\n  - {item}")).collect()
}
