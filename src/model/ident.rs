//! Identifiers: what the user typed to name a resource.
//!
//! Grammar: `[owner "/"] name_or_id [":" revision]`.
//!
//! - No `/` means "any owner the caller can see".
//! - `*` and `?` in the owner or name are shell globs, never regex.
//! - `\:` is a literal colon inside the name.
//! - Revisions only exist for projects.

use std::fmt;

use crate::error::{Error, Result};

use super::ResourceKind;

/// The revision alias that always means "most recently created".
pub const LATEST: &str = "latest";

/// A parsed, immutable resource identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    raw: String,
    owner: Option<String>,
    name_or_id: String,
    revision: Option<String>,
    /// Matches on `id` only; never falls back to names or globs.
    literal: bool,
}

impl Identifier {
    /// Parses a user-supplied identifier for the given kind.
    pub fn parse(raw: &str, kind: ResourceKind) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedIdentifier {
            input: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(malformed("identifier is empty"));
        }

        let (head, revision) = split_revision(raw);

        if let Some(rev) = &revision {
            if rev.is_empty() {
                return Err(malformed("revision after ':' is empty"));
            }
            if !kind.has_revisions() {
                return Err(malformed(&format!("a {kind} has no revisions")));
            }
        }

        let (owner, name_or_id) = match head.split_once('/') {
            Some((owner, _)) if owner.is_empty() => {
                return Err(malformed("owner before '/' is empty"));
            }
            Some((_, name)) if name.is_empty() => {
                return Err(malformed("name after '/' is empty"));
            }
            Some((_, name)) if name.contains('/') => {
                return Err(malformed("expected at most one '/'"));
            }
            Some((owner, name)) => (Some(owner.to_string()), name.to_string()),
            None if head.is_empty() => return Err(malformed("name is empty")),
            None => (None, head.clone()),
        };

        Ok(Self {
            raw: raw.to_string(),
            owner,
            name_or_id,
            revision,
            literal: false,
        })
    }

    /// An identifier that names a record by its literal id. Wildcards in
    /// `id` are plain characters.
    pub fn from_id(id: &str) -> Self {
        Self {
            raw: id.to_string(),
            owner: None,
            name_or_id: id.to_string(),
            revision: None,
            literal: true,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn name_or_id(&self) -> &str {
        &self.name_or_id
    }

    /// The revision as typed, if any.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Whether this names the latest revision, explicitly or by omission.
    pub fn wants_latest(&self) -> bool {
        self.revision.as_deref().is_none_or(|r| r == LATEST)
    }

    /// The same identifier with the revision selector dropped.
    pub fn without_revision(&self) -> Self {
        Self {
            revision: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits at the first unescaped `:`, unescaping `\:` on the way.
fn split_revision(raw: &str) -> (String, Option<String>) {
    let mut head = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&':') => {
                head.push(':');
                chars.next();
            }
            ':' => return (head, Some(chars.collect())),
            _ => head.push(c),
        }
    }
    (head, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(raw: &str) -> Identifier {
        Identifier::parse(raw, ResourceKind::Project).unwrap()
    }

    fn reason(raw: &str, kind: ResourceKind) -> String {
        match Identifier::parse(raw, kind).unwrap_err() {
            Error::MalformedIdentifier { reason, .. } => reason,
            other => panic!("expected MalformedIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn bare_name() {
        let id = project("proj1");
        assert_eq!(id.owner(), None);
        assert_eq!(id.name_or_id(), "proj1");
        assert_eq!(id.revision(), None);
        assert!(id.wants_latest());
    }

    #[test]
    fn owner_name_and_revision() {
        let id = project("u1/proj1:0.1.0");
        assert_eq!(id.owner(), Some("u1"));
        assert_eq!(id.name_or_id(), "proj1");
        assert_eq!(id.revision(), Some("0.1.0"));
        assert!(!id.wants_latest());
        assert_eq!(id.to_string(), "u1/proj1:0.1.0");
    }

    #[test]
    fn explicit_latest_is_latest() {
        assert!(project("proj1:latest").wants_latest());
    }

    #[test]
    fn wildcards_are_kept_verbatim() {
        let id = Identifier::parse("u?/te*job", ResourceKind::Job).unwrap();
        assert_eq!(id.owner(), Some("u?"));
        assert_eq!(id.name_or_id(), "te*job");
    }

    #[test]
    fn escaped_colon_stays_in_name() {
        let id = Identifier::parse(r"odd\:name", ResourceKind::Session).unwrap();
        assert_eq!(id.name_or_id(), "odd:name");
        assert_eq!(id.revision(), None);
    }

    #[test]
    fn without_revision_drops_only_revision() {
        let id = project("u1/proj1:0.1.0").without_revision();
        assert_eq!(id.owner(), Some("u1"));
        assert_eq!(id.revision(), None);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(reason("", ResourceKind::Job), "identifier is empty");
        assert_eq!(reason("   ", ResourceKind::Job), "identifier is empty");
    }

    #[test]
    fn rejects_empty_revision() {
        assert_eq!(
            reason("proj1:", ResourceKind::Project),
            "revision after ':' is empty"
        );
    }

    #[test]
    fn rejects_revision_on_unrevisioned_kind() {
        assert_eq!(reason("job1:0.1.0", ResourceKind::Job), "a job has no revisions");
    }

    #[test]
    fn rejects_empty_segments() {
        assert_eq!(
            reason("/proj1", ResourceKind::Project),
            "owner before '/' is empty"
        );
        assert_eq!(
            reason("u1/", ResourceKind::Project),
            "name after '/' is empty"
        );
        assert_eq!(reason(":0.1.0", ResourceKind::Project), "name is empty");
        assert_eq!(
            reason("a/b/c", ResourceKind::Project),
            "expected at most one '/'"
        );
    }
}
