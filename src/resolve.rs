//! Candidate resolution: narrow a listing to the records an identifier names.
//!
//! Pure functions over a supplied record list. The caller fetches the
//! listing; nothing here performs I/O, so every rule is unit-testable.
//!
//! Rules, in order, stopping at the first that matches anything:
//!
//! 1. Exact match on `id`. A literal id is unambiguous, so this ignores
//!    owner and wildcards entirely.
//! 2. Exact match on `(owner, name)` when an owner was given.
//! 3. Glob match on `name`, narrowed by a glob on `owner` when given.
//!
//! Identifiers built with [`Identifier::from_id`] stop after rule 1.

use std::collections::BTreeMap;

use globset::{Glob, GlobMatcher};
use jiff::Timestamp;

use crate::error::{Error, Result};
use crate::model::{Identifier, LATEST, Record, ResourceKind};

/// Resolves an identifier to exactly one record.
///
/// For kinds with revisions, records may repeat a project once per
/// revision; see [`select_revisions`].
pub fn resolve<'a>(
    ident: &Identifier,
    records: &'a [Record],
    kind: ResourceKind,
) -> Result<&'a Record> {
    let mut candidates = matching(ident, records);
    if kind.has_revisions() {
        candidates = select_revisions(ident, candidates);
    }

    match candidates.len() {
        0 => Err(Error::NotFound {
            kind,
            ident: ident.to_string(),
        }),
        1 => Ok(candidates[0]),
        _ => Err(Error::Ambiguous {
            kind,
            ident: ident.to_string(),
            candidates: candidates.into_iter().cloned().collect(),
        }),
    }
}

/// Every record the identifier could mean. Zero or many is fine here.
pub fn matching<'a>(ident: &Identifier, records: &'a [Record]) -> Vec<&'a Record> {
    let by_id: Vec<&Record> = records
        .iter()
        .filter(|r| r.id() == Some(ident.name_or_id()))
        .collect();
    if !by_id.is_empty() || ident.is_literal() {
        return by_id;
    }

    if let Some(owner) = ident.owner() {
        let exact: Vec<&Record> = records
            .iter()
            .filter(|r| r.owner() == Some(owner) && r.name() == Some(ident.name_or_id()))
            .collect();
        if !exact.is_empty() {
            return exact;
        }
    }

    let name = Pattern::new(ident.name_or_id());
    let owner = ident.owner().map(Pattern::new);
    records
        .iter()
        .filter(|r| name.matches(r.name()))
        .filter(|r| owner.as_ref().is_none_or(|o| o.matches(r.owner())))
        .collect()
}

/// Records whose fields match every `field -> pattern` pair (globs allowed).
pub fn filter<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    filters: &BTreeMap<String, String>,
) -> Vec<&'a Record> {
    let patterns: Vec<(&str, Pattern)> = filters
        .iter()
        .map(|(field, value)| (field.as_str(), Pattern::new(value)))
        .collect();
    records
        .into_iter()
        .filter(|r| {
            patterns
                .iter()
                .all(|(field, pattern)| pattern.matches(Some(&r.text(field))))
        })
        .collect()
}

/// Picks one revision per project among name-matched candidates.
///
/// A literal revision must match a tag exactly; it is never globbed.
/// `latest` (or no revision) keeps the most recently created revision of
/// each project, grouping candidates by `id`.
fn select_revisions<'a>(ident: &Identifier, candidates: Vec<&'a Record>) -> Vec<&'a Record> {
    if let Some(tag) = ident.revision().filter(|r| *r != LATEST) {
        return candidates
            .into_iter()
            .filter(|r| r.revision() == Some(tag))
            .collect();
    }

    let mut latest: Vec<&Record> = Vec::new();
    for record in candidates {
        match latest.iter_mut().find(|kept| kept.id() == record.id()) {
            Some(kept) => {
                if created_key(record) > created_key(*kept) {
                    *kept = record;
                }
            }
            None => latest.push(record),
        }
    }
    latest
}

/// Sort key for `created`: parsed timestamps first, raw text as tiebreak.
fn created_key(record: &Record) -> (Option<Timestamp>, Option<&str>) {
    let raw = record.created();
    (raw.and_then(|s| s.parse().ok()), raw)
}

/// A name pattern: shell glob when it has wildcards, literal otherwise.
enum Pattern {
    Literal(String),
    Glob(GlobMatcher),
}

impl Pattern {
    fn new(pattern: &str) -> Self {
        if !pattern.contains(['*', '?', '[']) {
            return Self::Literal(pattern.to_string());
        }
        // An unparseable glob (e.g. an unclosed `[`) can only mean the literal text.
        match Glob::new(pattern) {
            Ok(glob) => Self::Glob(glob.compile_matcher()),
            Err(_) => Self::Literal(pattern.to_string()),
        }
    }

    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Self::Literal(text) => text == value,
            Self::Glob(matcher) => matcher.is_match(value),
        }
    }
}
