//! Field-level checks that record failures instead of returning early.

use crate::models::{parse_ip, Ipv4};
use serde_json::{Map, Value};

/// A JSON object being validated, with its dotted path.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    path: String,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Section<'a> {
    /// Top-level section; `None` when the document is not an object.
    pub fn root(doc: &'a Value) -> Section<'a> {
        Section {
            path: String::new(),
            map: doc.as_object(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key))
    }

    pub fn is_object(&self) -> bool {
        self.map.is_some()
    }

    pub fn path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }
}

/// Collects every violation found in one pass.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Validator {
        Validator::default()
    }

    pub fn error(&mut self, path: &str, msg: impl AsRef<str>) {
        let line = format!("{path}: {}", msg.as_ref());
        log::debug!("validation: {line}");
        self.errors.push(line);
    }

    pub fn finish(self) -> Vec<String> {
        self.errors
    }

    /// Nested object. A missing or mistyped section is reported once and
    /// then behaves as empty, so each required field inside is reported too.
    pub fn section<'a>(&mut self, parent: &Section<'a>, key: &str) -> Section<'a> {
        let path = parent.path(key);
        match parent.get(key) {
            Some(Value::Object(map)) => Section {
                path,
                map: Some(map),
            },
            _ => {
                self.error(&path, "must be an object");
                Section { path, map: None }
            }
        }
    }

    /// Object element of an array at `path[index]`.
    pub fn element<'a>(&mut self, path: &str, index: usize, value: &'a Value) -> Section<'a> {
        let path = format!("{path}[{index}]");
        let map = value.as_object();
        if map.is_none() {
            self.error(&path, "must be an object");
        }
        Section { path, map }
    }

    /// Nested object that only has to exist when `required` holds.
    pub fn optional_section<'a>(
        &mut self,
        parent: &Section<'a>,
        key: &str,
        required: bool,
        reason: &str,
    ) -> Option<Section<'a>> {
        let path = parent.path(key);
        match parent.get(key) {
            Some(Value::Object(map)) => Some(Section {
                path,
                map: Some(map),
            }),
            _ if required => {
                self.error(&path, format!("must be an object ({reason})"));
                None
            }
            _ => None,
        }
    }

    /// Strict boolean: `0`, `"true"` and the like are rejected.
    pub fn bool(&mut self, sec: &Section, key: &str) -> Option<bool> {
        match sec.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => {
                self.error(&sec.path(key), "must be true or false");
                None
            }
        }
    }

    pub fn non_empty_str<'a>(&mut self, sec: &Section<'a>, key: &str) -> Option<&'a str> {
        match sec.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => {
                self.error(&sec.path(key), "must be a non-empty string");
                None
            }
        }
    }

    /// Any string, empty allowed.
    pub fn string<'a>(&mut self, sec: &Section<'a>, key: &str, hint: &str) -> Option<&'a str> {
        match sec.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => {
                self.error(&sec.path(key), format!("must be a string{hint}"));
                None
            }
        }
    }

    /// Integer; booleans and floats are rejected.
    pub fn int(&mut self, sec: &Section, key: &str) -> Option<i64> {
        match sec.get(key) {
            Some(Value::Number(n)) if n.is_u64() && n.as_i64().is_none() => {
                self.error(&sec.path(key), "integer out of range");
                None
            }
            Some(Value::Number(n)) if n.is_i64() => n.as_i64(),
            _ => {
                self.error(&sec.path(key), "must be an integer");
                None
            }
        }
    }

    /// Required CIDR with no host bits set.
    pub fn cidr(&mut self, sec: &Section, key: &str) -> Option<Ipv4> {
        self.cidr_value(sec.get(key), &sec.path(key))
    }

    pub fn cidr_value(&mut self, value: Option<&Value>, path: &str) -> Option<Ipv4> {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => match Ipv4::parse_strict(s) {
                Ok(cidr) => Some(cidr),
                Err(e) => {
                    self.error(path, format!("is not a valid CIDR ({e}), value={s:?}"));
                    None
                }
            },
            _ => {
                self.error(path, "must be a CIDR in x.x.x.x/nn form");
                None
            }
        }
    }

    /// Optional IPv4 address; absent or empty string means unset.
    pub fn optional_ip_value(&mut self, value: Option<&Value>, path: &str) {
        match value {
            None => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(Value::String(s)) => {
                if parse_ip(s).is_err() {
                    self.error(path, format!("is not a valid IP address, value={s:?}"));
                }
            }
            Some(_) => self.error(path, "must be an IPv4 address string or empty string"),
        }
    }

    pub fn optional_ip(&mut self, sec: &Section, key: &str) {
        self.optional_ip_value(sec.get(key), &sec.path(key));
    }

    /// Optional IPv4 address or strict CIDR; absent or empty string means unset.
    pub fn optional_ip_or_cidr(&mut self, sec: &Section, key: &str) {
        let path = sec.path(key);
        match sec.get(key) {
            None => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(Value::String(s)) => {
                let ok = if s.contains('/') {
                    Ipv4::parse_strict(s).is_ok()
                } else {
                    parse_ip(s).is_ok()
                };
                if !ok {
                    self.error(&path, format!("is not a valid IP address or CIDR, value={s:?}"));
                }
            }
            Some(_) => self.error(&path, "must be an IPv4 address/CIDR string or empty string"),
        }
    }

    /// Array value, reported when missing or not an array.
    pub fn array<'a>(&mut self, sec: &Section<'a>, key: &str, hint: &str) -> Option<&'a Vec<Value>> {
        match sec.get(key) {
            Some(Value::Array(items)) => Some(items),
            _ => {
                self.error(&sec.path(key), format!("must be an array{hint}"));
                None
            }
        }
    }

    pub fn one_of(&mut self, value: Option<&str>, path: &str, allowed: &[&str]) {
        if let Some(v) = value {
            if !allowed.contains(&v) {
                self.error(path, format!("must be one of {}", allowed.join(" / ")));
            }
        }
    }

    pub fn in_range(&mut self, value: Option<i64>, path: &str, min: i64, max: i64) {
        if let Some(v) = value {
            if !(min..=max).contains(&v) {
                self.error(path, format!("must be between {min} and {max}"));
            }
        }
    }

    pub fn at_least(&mut self, value: Option<i64>, path: &str, min: i64) {
        if let Some(v) = value {
            if v < min {
                self.error(path, format!("must be an integer >= {min}"));
            }
        }
    }
}
