//! Bicep literal rendering.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid Regex?");
}

/// Single-quoted Bicep string, embedded quotes doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Object keys stay bare when they are identifiers.
pub fn key_literal(key: &str) -> String {
    if IDENT_RE.is_match(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Render a JSON value as a Bicep literal.
///
/// Arrays and objects are written one item per line, indented two spaces
/// per nesting level starting from `indent`.
pub fn to_bicep(value: &Value, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let inner = " ".repeat(indent + 2);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|v| format!("{inner}{}", to_bicep(v, indent + 2)))
                .collect();
            format!("[\n{}\n{pad}]", lines.join("\n"))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{inner}{}: {}", key_literal(k), to_bicep(v, indent + 2)))
                .collect();
            format!("{{\n{}\n{pad}}}", lines.join("\n"))
        }
    }
}

/// `param <name> = <literal>`
pub fn param_line(name: &str, value: &Value) -> String {
    format!("param {name} = {}", to_bicep(value, 0))
}
