//! Resource kinds: the entity types a command acts on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The entity type a command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Job,
    Run,
    Session,
    Deployment,
    Secret,
    User,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Job => "job",
            Self::Run => "run",
            Self::Session => "session",
            Self::Deployment => "deployment",
            Self::Secret => "secret",
            Self::User => "user",
        }
    }

    /// Whether records of this kind come in tagged revisions.
    ///
    /// Only projects do; `owner/name:0.1.0` is meaningless for anything else.
    pub fn has_revisions(self) -> bool {
        matches!(self, Self::Project)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
