//! Reference token resolution.
//!
//! Subnets are known by a full resource name, a short alias and, for the
//! older definition format, a legacy token. Rules and routes refer to them
//! through any of these; the resolver maps each reference to the allocated
//! prefix of the subnet, or keeps it as a literal when it is an address or
//! service tag.

use crate::error::{Error, Result};
use crate::models::{is_ip_or_cidr, AllocatedSubnet, Ipv4, SubnetDefinition};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

pub const ANY: &str = "*";
pub const SELF_TOKEN: &str = "@self";
pub const MAINT_BASTION_SELECTOR: &str = "maintBastion";

/// Deprecated `@ref:<token>` references (`@nsg-rule:` in the oldest files).
static LEGACY_REF_REGEX: OnceLock<Regex> = OnceLock::new();

fn legacy_ref_regex() -> &'static Regex {
    LEGACY_REF_REGEX.get_or_init(|| Regex::new(r"^@(?:ref|nsg-rule):(.+)$").expect("Invalid Regex"))
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// `*`
    Any,
    /// IP address, CIDR block or service tag, kept verbatim.
    Literal(String),
    /// An allocated subnet.
    Subnet { alias: String, prefix: Ipv4 },
    /// Nothing matched; the caller decides whether that is fatal.
    Unresolved(String),
}

impl Resolved {
    /// Value to put in an address prefix field.
    pub fn address(&self) -> Option<String> {
        match self {
            Resolved::Any => Some(ANY.to_string()),
            Resolved::Literal(v) => Some(v.clone()),
            Resolved::Subnet { prefix, .. } => Some(prefix.to_string()),
            Resolved::Unresolved(_) => None,
        }
    }
}

/// Named indirection: an external address when configured, otherwise the
/// prefix of a fallback subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub override_ip: Option<String>,
    pub fallback_alias: String,
}

#[derive(Debug, Default)]
pub struct AliasResolver {
    name_to_alias: HashMap<String, String>,
    alias_to_name: HashMap<String, String>,
    alias_to_token: HashMap<String, String>,
    token_to_alias: HashMap<String, String>,
    prefixes: HashMap<String, Ipv4>,
    service_tags: HashSet<String>,
    selectors: BTreeMap<String, Selector>,
}

impl AliasResolver {
    /// Build the lookup maps from the definitions and their allocation.
    pub fn new(definitions: &[SubnetDefinition], allocated: &[AllocatedSubnet]) -> AliasResolver {
        let mut resolver = AliasResolver::default();
        for def in definitions {
            resolver
                .name_to_alias
                .insert(def.name.clone(), def.alias.clone());
            resolver
                .alias_to_name
                .insert(def.alias.clone(), def.name.clone());
            if let Some(token) = &def.legacy_token {
                resolver
                    .alias_to_token
                    .insert(def.alias.clone(), token.clone());
                resolver
                    .token_to_alias
                    .insert(token.clone(), def.alias.clone());
            }
        }
        for subnet in allocated {
            resolver
                .prefixes
                .insert(subnet.alias.clone(), subnet.address_prefix);
        }
        log::debug!(
            "Alias resolver: {} subnet(s), {} legacy token(s)",
            resolver.prefixes.len(),
            resolver.token_to_alias.len()
        );
        resolver
    }

    pub fn with_service_tags<I, S>(mut self, tags: I) -> AliasResolver
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_selector(mut self, name: impl Into<String>, selector: Selector) -> AliasResolver {
        self.selectors.insert(name.into(), selector);
        self
    }

    pub fn alias_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_alias.get(name).map(String::as_str)
    }

    pub fn name_for_alias(&self, alias: &str) -> Option<&str> {
        self.alias_to_name.get(alias).map(String::as_str)
    }

    pub fn token_for_alias(&self, alias: &str) -> Option<&str> {
        self.alias_to_token.get(alias).map(String::as_str)
    }

    pub fn alias_for_token(&self, token: &str) -> Option<&str> {
        self.token_to_alias.get(token).map(String::as_str)
    }

    /// Allocated prefix of the subnet with this alias.
    pub fn prefix_of(&self, alias: &str) -> Option<Ipv4> {
        self.prefixes.get(alias).copied()
    }

    pub fn is_allocated(&self, alias: &str) -> bool {
        self.prefixes.contains_key(alias)
    }

    /// Alias of an allocated subnet referenced by alias or full name.
    pub fn lookup(&self, reference: &str) -> Option<&str> {
        if let Some((alias, _)) = self.prefixes.get_key_value(reference) {
            return Some(alias.as_str());
        }
        self.alias_for_name(reference)
            .filter(|alias| self.is_allocated(alias))
    }

    fn subnet(&self, alias: &str) -> Option<Resolved> {
        self.prefix_of(alias).map(|prefix| Resolved::Subnet {
            alias: alias.to_string(),
            prefix,
        })
    }

    /// Resolve a reference appearing in a rule owned by `owner_alias`.
    ///
    /// Literals win over subnet lookups, so a subnet can never shadow an
    /// address or service tag.
    pub fn resolve(&self, token: &str, owner_alias: &str) -> Resolved {
        let token = token.trim();
        if token == ANY {
            return Resolved::Any;
        }
        if is_ip_or_cidr(token) || self.service_tags.contains(token) {
            return Resolved::Literal(token.to_string());
        }
        if token == SELF_TOKEN {
            log::warn!("'{SELF_TOKEN}' references are deprecated, use the subnet alias '{owner_alias}'");
            return self
                .subnet(owner_alias)
                .unwrap_or_else(|| Resolved::Unresolved(token.to_string()));
        }
        if let Some(caps) = legacy_ref_regex().captures(token) {
            let legacy = &caps[1];
            log::warn!("Legacy reference '{token}' is deprecated, use the subnet alias");
            return self
                .alias_for_token(legacy)
                .and_then(|alias| self.subnet(alias))
                .unwrap_or_else(|| Resolved::Unresolved(token.to_string()));
        }
        if let Some(alias) = self.lookup(token) {
            if let Some(resolved) = self.subnet(alias) {
                return resolved;
            }
        }
        log::debug!("Reference '{token}' did not resolve");
        Resolved::Unresolved(token.to_string())
    }

    /// Resolve a named selector to an address or prefix.
    pub fn resolve_selector(&self, name: &str) -> Result<String> {
        let selector = self
            .selectors
            .get(name)
            .ok_or_else(|| Error::resolution(format!("unknown selector '{name}'")))?;
        if let Some(ip) = selector
            .override_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            log::debug!("Selector '{name}' resolved to override {ip}");
            return Ok(ip.to_string());
        }
        match self.prefix_of(&selector.fallback_alias) {
            Some(prefix) => {
                log::debug!(
                    "Selector '{name}' resolved to subnet '{}' {prefix}",
                    selector.fallback_alias
                );
                Ok(prefix.to_string())
            }
            None => Err(Error::resolution(format!(
                "selector '{name}' needs an override address or an allocated '{}' subnet",
                selector.fallback_alias
            ))),
        }
    }
}
