//! Structured value rendering.
//!
//! Turns a `serde_json::Value` into a compact, human-readable representation
//! similar to a REPL inspector: unquoted identifier keys, single-quoted
//! strings, depth elision, and line breaking for wide values.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Controls how structured values are rendered
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InspectOptions {
    /// Nesting level past which containers are elided; `None` for unlimited
    pub depth: Option<usize>,

    /// Keep values on one line while they fit in `break_length`
    pub compact: bool,

    pub break_length: usize,

    /// Sort object keys alphabetically
    pub sort_keys: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: Some(2),
            compact: true,
            break_length: 80,
            sort_keys: false,
        }
    }
}

/// Render a value for display.
///
/// A top-level string is returned unchanged; everything else goes through
/// the inspector.
pub fn inspect(value: &Value, options: &InspectOptions, colors: bool) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => Inspector { options, colors }.render(other, 0, 0, 0),
    }
}

struct Inspector<'a> {
    options: &'a InspectOptions,
    colors: bool,
}

impl Inspector<'_> {
    /// `prefix` is the width already taken on the first line by an
    /// object key and its `: ` separator.
    fn render(&self, value: &Value, level: usize, indent: usize, prefix: usize) -> String {
        match value {
            Value::Null => self.paint_null(),
            Value::Bool(b) => self.paint_number(&b.to_string()),
            Value::Number(n) => self.paint_number(&n.to_string()),
            Value::String(s) => self.paint_string(&quote(s)),
            Value::Array(items) => {
                if items.is_empty() {
                    return "[]".into();
                }
                if self.too_deep(level) {
                    return self.paint_special("[Array]");
                }
                let entries: Vec<String> = items
                    .iter()
                    .map(|item| self.render(item, level + 1, indent + 2, 0))
                    .collect();
                self.layout('[', ']', entries, indent, prefix)
            }
            Value::Object(map) => {
                if map.is_empty() {
                    return "{}".into();
                }
                if self.too_deep(level) {
                    return self.paint_special("[Object]");
                }
                let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
                if self.options.sort_keys {
                    pairs.sort_by(|a, b| a.0.cmp(b.0));
                }
                let entries: Vec<String> = pairs
                    .into_iter()
                    .map(|(k, v)| {
                        let key = format_key(k);
                        let rendered = self.render(v, level + 1, indent + 2, key.chars().count() + 2);
                        format!("{}: {}", key, rendered)
                    })
                    .collect();
                self.layout('{', '}', entries, indent, prefix)
            }
        }
    }

    fn too_deep(&self, level: usize) -> bool {
        self.options.depth.is_some_and(|d| level > d)
    }

    fn layout(
        &self,
        open: char,
        close: char,
        entries: Vec<String>,
        indent: usize,
        prefix: usize,
    ) -> String {
        let single = format!("{} {} {}", open, entries.join(", "), close);
        let fits = indent + prefix + visible_len(&single) <= self.options.break_length;
        if self.options.compact && fits && !single.contains('\n') {
            return single;
        }

        let pad = " ".repeat(indent + 2);
        let body = entries
            .iter()
            .map(|e| format!("{}{}", pad, e))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{}\n{}\n{}{}", open, body, " ".repeat(indent), close)
    }

    fn paint_string(&self, s: &str) -> String {
        if self.colors {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_number(&self, s: &str) -> String {
        if self.colors {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_null(&self) -> String {
        if self.colors {
            "null".bold().to_string()
        } else {
            "null".to_string()
        }
    }

    fn paint_special(&self, s: &str) -> String {
        if self.colors {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_ident = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };
    if is_ident {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Length of a string as displayed, ignoring ANSI escape sequences
fn visible_len(s: &str) -> usize {
    let mut len = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            len += 1;
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain(value: &Value) -> String {
        inspect(value, &InspectOptions::default(), false)
    }

    #[test]
    fn test_top_level_string_is_verbatim() {
        assert_eq!(plain(&json!("it's fine")), "it's fine");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(plain(&json!(null)), "null");
        assert_eq!(plain(&json!(true)), "true");
        assert_eq!(plain(&json!(1.5)), "1.5");
    }

    #[test]
    fn test_object_single_line() {
        let v = json!({ "name": "disk", "free": 12, "tags": ["a", "b"] });
        assert_eq!(plain(&v), "{ name: 'disk', free: 12, tags: [ 'a', 'b' ] }");
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(plain(&json!({})), "{}");
        assert_eq!(plain(&json!([])), "[]");
    }

    #[test]
    fn test_non_identifier_keys_are_quoted() {
        let v = json!({ "content-type": "text", "_ok": 1 });
        let out = plain(&v);
        assert!(out.contains("'content-type': 'text'"));
        assert!(out.contains("_ok: 1"));
    }

    #[test]
    fn test_depth_elision() {
        let v = json!({ "a": { "b": { "c": { "d": 1 } } }, "list": [[[[1]]]] });
        let out = plain(&v);
        assert!(out.contains("c: [Object]"), "{}", out);
        assert!(out.contains("list: [ [ [Array] ] ]"), "{}", out);

        let unlimited = InspectOptions {
            depth: None,
            ..Default::default()
        };
        let out = inspect(&v, &unlimited, false);
        assert!(out.contains("d: 1"));
    }

    #[test]
    fn test_non_compact_breaks_lines() {
        let options = InspectOptions {
            compact: false,
            ..Default::default()
        };
        let out = inspect(&json!({ "a": 1, "b": [2] }), &options, false);
        assert_eq!(out, "{\n  a: 1,\n  b: [\n    2\n  ]\n}");
    }

    #[test]
    fn test_wide_values_break_lines() {
        let options = InspectOptions {
            break_length: 20,
            ..Default::default()
        };
        let out = inspect(&json!({ "first": "aaaaaaaa", "second": "bbbbbbbb" }), &options, false);
        assert_eq!(out, "{\n  first: 'aaaaaaaa',\n  second: 'bbbbbbbb'\n}");
    }

    #[test]
    fn test_key_width_counts_toward_break_length() {
        let options = InspectOptions {
            break_length: 24,
            ..Default::default()
        };
        let out = inspect(&json!({ "key": { "inner": "abcdefgh" } }), &options, false);
        assert_eq!(out, "{\n  key: {\n    inner: 'abcdefgh'\n  }\n}");
        assert!(out.lines().all(|line| line.len() <= 24), "{}", out);
    }

    #[test]
    fn test_sort_keys() {
        let options = InspectOptions {
            sort_keys: true,
            ..Default::default()
        };
        let out = inspect(&json!({ "zeta": 1, "alpha": 2 }), &options, false);
        assert_eq!(out, "{ alpha: 2, zeta: 1 }");
    }

    #[test]
    fn test_nested_string_escaping() {
        assert_eq!(plain(&json!(["it's\n"])), "[ 'it\\'s\\n' ]");
    }

    #[test]
    fn test_visible_len_skips_ansi() {
        assert_eq!(visible_len("\x1b[32m'a'\x1b[0m"), 3);
    }
}
