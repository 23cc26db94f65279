//! Subnet definition document.

use super::checks::{Section, Validator};
use serde_json::Value;
use std::collections::HashMap;

/// Azure accepts subnets between /8 and /29.
pub const MIN_PREFIX_LENGTH: i64 = 8;
pub const MAX_PREFIX_LENGTH: i64 = 29;

/// Keys that can carry the legacy token of an older definition format.
const LEGACY_KEYS: [&str; 2] = ["nsg-rule", "legacyToken"];

pub(super) fn check_subnets(v: &mut Validator, doc: &Value) {
    let root = Section::root(doc);
    if !root.is_object() {
        v.error("subnetDefinitions", "document must be an object");
        return;
    }
    let Some(items) = v.array(&root, "subnetDefinitions", " of subnet definitions") else {
        return;
    };
    if items.is_empty() {
        v.error("subnetDefinitions", "needs at least one definition");
        return;
    }

    let mut names: HashMap<String, usize> = HashMap::new();
    let mut aliases: HashMap<String, usize> = HashMap::new();
    let mut tokens: HashMap<String, usize> = HashMap::new();

    for (i, item) in items.iter().enumerate() {
        let entry = v.element("subnetDefinitions", i, item);
        if !entry.is_object() {
            continue;
        }
        let name = v.non_empty_str(&entry, "name");
        let prefix = v.int(&entry, "prefixLength");
        v.in_range(
            prefix,
            &entry.path("prefixLength"),
            MIN_PREFIX_LENGTH,
            MAX_PREFIX_LENGTH,
        );

        let mut alias = None;
        let mut token = None;
        for key in std::iter::once("alias").chain(LEGACY_KEYS) {
            match entry.get(key) {
                None => {}
                Some(Value::String(s)) if !s.trim().is_empty() => {
                    alias = alias.or(Some(s.trim()));
                    if key != "alias" && token.is_none() {
                        token = Some((key, s.trim()));
                    }
                }
                Some(_) => v.error(&entry.path(key), "must be a non-empty string when set"),
            }
        }

        if let Some(name) = name {
            if let Some(first) = names.insert(name.to_string(), i) {
                v.error(
                    &entry.path("name"),
                    format!("duplicate name '{name}' (also subnetDefinitions[{first}])"),
                );
            }
        }
        if let Some(alias) = alias.or(name) {
            if let Some(first) = aliases.insert(alias.to_string(), i) {
                v.error(
                    &entry.path("alias"),
                    format!("duplicate alias '{alias}' (also subnetDefinitions[{first}])"),
                );
            }
        }
        // Legacy tokens are unique across entries.
        if let Some((key, token)) = token {
            if let Some(first) = tokens.insert(token.to_string(), i) {
                v.error(
                    &entry.path(key),
                    format!("duplicate legacy token '{token}' (also subnetDefinitions[{first}])"),
                );
            }
        }
    }
}
