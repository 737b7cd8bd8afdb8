//! `key=value` option lists: job variables and list filters.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A normalized variable list.
///
/// `None` leaves existing variables alone, `Some` of an empty map clears
/// them, and any other `Some` replaces them.
pub type Variables = Option<BTreeMap<String, String>>;

/// Parses `key=value` entries, honoring an explicit "clear" flag.
///
/// Each entry splits at its first `=`, so values may contain `=` themselves.
/// Keys are right-trimmed and values left-trimmed; nothing else is touched.
/// Every malformed entry is reported at once. Repeated keys are allowed and
/// the last one wins.
pub fn normalize(pairs: &[String], clear: bool) -> Result<Variables> {
    if pairs.is_empty() {
        return Ok(clear.then(BTreeMap::new));
    }
    if clear {
        return Err(Error::ConflictingOptions(
            "cannot supply both --variable and --clear-variables".to_string(),
        ));
    }

    let mut variables = BTreeMap::new();
    let mut invalid = Vec::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim_end().is_empty() => {
                variables.insert(key.trim_end().to_string(), value.trim_start().to_string());
            }
            _ => invalid.push(pair.clone()),
        }
    }

    if invalid.is_empty() {
        Ok(Some(variables))
    } else {
        Err(Error::MalformedVariable(invalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn nothing_supplied_means_unchanged() {
        assert_eq!(normalize(&[], false).unwrap(), None);
    }

    #[test]
    fn clear_flag_alone_means_empty() {
        assert_eq!(normalize(&[], true).unwrap(), Some(BTreeMap::new()));
    }

    #[test]
    fn pairs_with_clear_conflict() {
        let err = normalize(&strings(&["a=1"]), true).unwrap_err();
        assert!(matches!(err, Error::ConflictingOptions(_)));
    }

    #[test]
    fn duplicates_are_allowed_and_last_wins() {
        let vars = normalize(&strings(&["a=1", "a=1"]), false).unwrap().unwrap();
        assert_eq!(vars.len(), 1);

        let vars = normalize(&strings(&["a=1", "a=2"]), false).unwrap().unwrap();
        assert_eq!(vars["a"], "2");
    }

    #[test]
    fn trims_only_at_the_split() {
        let vars = normalize(&strings(&[" key  =  value "]), false)
            .unwrap()
            .unwrap();
        assert_eq!(vars[" key"], "value ");
    }

    #[test]
    fn value_may_contain_equals() {
        let vars = normalize(&strings(&["url=a=b"]), false).unwrap().unwrap();
        assert_eq!(vars["url"], "a=b");
    }

    #[test]
    fn missing_equals_is_reported() {
        let err = normalize(&strings(&["noequals"]), false).unwrap_err();
        match err {
            Error::MalformedVariable(bad) => assert_eq!(bad, strings(&["noequals"])),
            other => panic!("expected MalformedVariable, got {other:?}"),
        }
    }

    #[test]
    fn every_bad_entry_is_reported_together() {
        let err = normalize(&strings(&["x", "ok=1", "=empty", "y"]), false).unwrap_err();
        match err {
            Error::MalformedVariable(bad) => assert_eq!(bad, strings(&["x", "=empty", "y"])),
            other => panic!("expected MalformedVariable, got {other:?}"),
        }
    }
}
