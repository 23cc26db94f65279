//! Subnet definition file and its normalization.
//!
//! Two configuration generations coexist: the current alias-keyed form
//! `{name, alias, prefixLength}` and the older form keyed by name plus a
//! reference token (`nsg-rule`). Both collapse here, once, into the
//! canonical [`SubnetDefinition`].

use super::{default_lock_kind, default_modules_name};
use crate::config::Settings;
use crate::models::SubnetDefinition;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Alias of the bastion subnet, dropped when a shared bastion is configured.
pub const BASTION_ALIAS: &str = "bastion";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetsConfig {
    #[serde(default = "default_modules_name")]
    pub modules_name: String,
    #[serde(default = "default_lock_kind")]
    pub lock_kind: String,
    pub subnet_definitions: Vec<SubnetEntry>,
}

/// One subnet entry as written, in either generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetEntry {
    pub name: String,
    pub alias: Option<String>,
    #[serde(rename = "nsg-rule", alias = "legacyToken")]
    pub legacy_token: Option<String>,
    pub prefix_length: u8,
    /// Any further subnet properties, passed through to the subnets parameters.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Which configuration generation an entry was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Aliased,
    Legacy,
    NameOnly,
}

impl SubnetEntry {
    pub fn generation(&self) -> Generation {
        match (&self.alias, &self.legacy_token) {
            (Some(_), _) => Generation::Aliased,
            (None, Some(_)) => Generation::Legacy,
            (None, None) => Generation::NameOnly,
        }
    }

    /// Collapse the entry into the canonical shape.
    ///
    /// Legacy entries are addressed by their token, so the token doubles as
    /// the alias when no explicit alias is given.
    pub fn normalize(&self) -> SubnetDefinition {
        let alias = match self.generation() {
            Generation::Aliased => self.alias.clone(),
            Generation::Legacy => self.legacy_token.clone(),
            Generation::NameOnly => None,
        }
        .unwrap_or_else(|| self.name.clone());

        SubnetDefinition {
            name: self.name.clone(),
            alias,
            prefix_length: self.prefix_length,
            legacy_token: self.legacy_token.clone(),
        }
    }
}

impl SubnetsConfig {
    /// Canonical definitions to allocate, in file order.
    ///
    /// With a shared bastion the local bastion subnet is not created.
    pub fn definitions(&self, settings: &Settings) -> Vec<SubnetDefinition> {
        let shared_bastion = settings.shared_bastion_ip().is_some();
        self.subnet_definitions
            .iter()
            .map(SubnetEntry::normalize)
            .filter(|def| {
                let drop = shared_bastion && def.alias == BASTION_ALIAS;
                if drop {
                    log::info!(
                        "sharedBastionIp is set, skipping subnet '{}' ({})",
                        def.name,
                        def.alias
                    );
                }
                !drop
            })
            .collect()
    }

    /// Extra properties of the entry whose canonical alias is `alias`.
    pub fn properties_for(&self, alias: &str) -> Option<&Map<String, Value>> {
        self.subnet_definitions
            .iter()
            .find(|e| e.normalize().alias == alias)
            .map(|e| &e.properties)
    }
}
