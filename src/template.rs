//! Message templates for confirmations and status lines.
//!
//! `{field}` is replaced from an explicit field map. Unknown fields are
//! left as written; `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;

pub fn render(template: &str, fields: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(['{', '}']) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{')
            && let Some(end) = tail.find('}')
        {
            let key = &tail[1..end];
            match fields.get(key) {
                Some(value) => out.push_str(value),
                None => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
            continue;
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_fields() {
        let f = fields(&[("ident", "u1/job1"), ("name", "job1")]);
        assert_eq!(render("Delete job {ident}", &f), "Delete job u1/job1");
        assert_eq!(render("{name}-{name}", &f), "job1-job1");
    }

    #[test]
    fn leaves_unknown_fields_alone() {
        assert_eq!(render("hello {who}", &fields(&[])), "hello {who}");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let f = fields(&[("x", "1")]);
        assert_eq!(render("{{x}} is {x}", &f), "{x} is 1");
    }

    #[test]
    fn unbalanced_braces_pass_through() {
        let f = fields(&[("x", "1")]);
        assert_eq!(render("a { b", &f), "a { b");
        assert_eq!(render("a } b {x}", &f), "a } b 1");
    }
}
