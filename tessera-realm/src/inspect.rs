use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::{ObjectId, ObjectKind, Realm, Value};

impl Realm {
    /// Renders a value on one line, REPL style: strings in single quotes,
    /// `1n` for bigints, `[Circular]` for a reference back to an enclosing
    /// object.
    pub fn inspect(&self, value: &Value) -> String {
        let mut out = String::new();
        let mut ancestors = Vec::new();
        self.inspect_into(&mut out, value, &mut ancestors);
        out
    }

    fn inspect_into(&self, out: &mut String, value: &Value, ancestors: &mut Vec<ObjectId>) {
        match value {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Value::Number(n) => write_number(out, *n),
            Value::BigInt(n) => {
                let _ = write!(out, "{n}n");
            }
            Value::String(s) => write_quoted(out, s),
            Value::Object(id) => {
                if ancestors.contains(id) {
                    out.push_str("[Circular]");
                    return;
                }
                let Ok(object) = self.object(*id) else {
                    let _ = write!(out, "<dangling {id}>");
                    return;
                };
                ancestors.push(*id);
                match &object.kind {
                    ObjectKind::Ordinary(props) => {
                        self.write_list(out, "{", "}", props.iter(), |realm, out, (k, v)| {
                            write_key(out, k);
                            out.push_str(": ");
                            realm.inspect_into(out, v, ancestors);
                        })
                    }
                    ObjectKind::Array(items) => {
                        self.write_list(out, "[", "]", items.iter(), |realm, out, v| {
                            realm.inspect_into(out, v, ancestors)
                        })
                    }
                    ObjectKind::TypedArray(array) => {
                        let _ = write!(out, "{}({}) ", array.kind().name(), array.len());
                        let items = (0..array.len()).filter_map(|i| array.get(i));
                        self.write_list(out, "[", "]", items, |realm, out, v| {
                            realm.inspect_into(out, &v, ancestors)
                        })
                    }
                    ObjectKind::Map(entries) => {
                        let _ = write!(out, "Map({}) ", entries.len());
                        self.write_list(out, "{", "}", entries.iter(), |realm, out, (k, v)| {
                            realm.inspect_into(out, k.value(), ancestors);
                            out.push_str(" => ");
                            realm.inspect_into(out, v, ancestors);
                        })
                    }
                    ObjectKind::Set(items) => {
                        let _ = write!(out, "Set({}) ", items.len());
                        self.write_list(out, "{", "}", items.iter(), |realm, out, k| {
                            realm.inspect_into(out, k.value(), ancestors)
                        })
                    }
                }
                ancestors.pop();
            }
        }
    }

    fn write_list<I>(
        &self,
        out: &mut String,
        open: &str,
        close: &str,
        items: impl Iterator<Item = I>,
        mut write_item: impl FnMut(&Self, &mut String, I),
    ) {
        out.push_str(open);
        let mut empty = true;
        for (i, item) in items.enumerate() {
            out.push_str(if i == 0 { " " } else { ", " });
            write_item(self, out, item);
            empty = false;
        }
        if !empty {
            out.push(' ');
        }
        out.push_str(close);
    }
}

fn write_number(out: &mut String, n: f64) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        // `Display` prints `-0` for negative zero and no fraction for integers
        let _ = write!(out, "{n}");
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn write_key(out: &mut String, key: &str) {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypedArray;

    #[test]
    fn numbers_render_like_the_runtime() {
        let realm = Realm::new();
        let render = |n: f64| realm.inspect(&Value::Number(n));
        assert_eq!(render(1.0), "1");
        assert_eq!(render(-0.0), "-0");
        assert_eq!(render(0.5), "0.5");
        assert_eq!(render(f64::NAN), "NaN");
        assert_eq!(render(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn typed_arrays_show_their_length() {
        let mut realm = Realm::new();
        let bytes = realm.create_typed_array(TypedArray::Uint8(vec![1, 2, 3]));
        assert_eq!(
            realm.inspect(&Value::Object(bytes)),
            "Uint8Array(3) [ 1, 2, 3 ]"
        );
        let empty = realm.create_typed_array(Vec::<i64>::new());
        assert_eq!(realm.inspect(&Value::Object(empty)), "BigInt64Array(0) []");
    }
}
