//! Human-readable rendering of changes.
//!
//! Short values render inline as `key: old -> new`. Multi-line string values
//! render as a line diff (Myers, via `similar`) so long notes stay readable.

use std::fmt::Write;

use changes_types::{Change, FieldValue};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use crate::attrs::{field_changes, FieldChange};

/// Render a change as a header line plus one line (or hunk) per attribute.
pub fn render_change(change: &Change) -> String {
    let mut out = format!("{change}\n");
    for field in field_changes(change) {
        render_field(&mut out, &field);
    }
    out
}

fn render_field(out: &mut String, field: &FieldChange) {
    if let (Some(old), Some(new)) = (multiline(&field.old), multiline(&field.new)) {
        let _ = writeln!(out, "  {}:", field.key);
        let diff = TextDiff::from_lines(old, new);
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Equal => ' ',
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
            };
            let _ = writeln!(out, "    {sign} {}", change.value().trim_end_matches('\n'));
        }
        return;
    }

    let _ = if field.is_added() {
        writeln!(out, "  + {}: {}", field.key, field.new)
    } else if field.is_removed() {
        writeln!(out, "  - {}: {}", field.key, field.old)
    } else {
        writeln!(out, "  ~ {}: {} -> {}", field.key, field.old, field.new)
    };
}

fn multiline(value: &FieldValue) -> Option<&str> {
    match value {
        FieldValue::Value(Value::String(s)) if s.contains('\n') => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use changes_types::{AttrMap, EntityRef};
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> AttrMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn annie() -> EntityRef {
        EntityRef::parse("/package/annie").unwrap()
    }

    #[test]
    fn renders_inline_fields() {
        let change = Change::update(
            annie(),
            map(&[("title", json!("orig")), ("gone", json!(1))]),
            map(&[("title", json!("corr")), ("fresh", json!(true))]),
        );
        let text = render_change(&change);
        assert!(text.starts_with("/package/annie updated\n"));
        assert!(text.contains("~ title: \"orig\" -> \"corr\""));
        assert!(text.contains("+ fresh: true"));
        assert!(text.contains("- gone: 1"));
    }

    #[test]
    fn renders_multiline_strings_as_line_diff() {
        let change = Change::update(
            annie(),
            map(&[("notes", json!("one\ntwo\nthree\n"))]),
            map(&[("notes", json!("one\n2\nthree\n"))]),
        );
        let text = render_change(&change);
        assert!(text.contains("  notes:\n"));
        assert!(text.contains("    - two"));
        assert!(text.contains("    + 2"));
        assert!(text.contains("      one"));
    }

    #[test]
    fn creation_lists_every_attribute() {
        let change = Change::create(annie(), map(&[("a", json!(1)), ("b", json!(2))]));
        let text = render_change(&change);
        assert!(text.contains("created"));
        assert_eq!(text.matches("  + ").count(), 2);
    }
}
