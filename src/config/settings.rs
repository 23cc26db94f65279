//! Typed view of the common parameter document.
//!
//! Built once after validation succeeds and passed by reference into every
//! stage. Only the sections the network compiler consumes are modelled; the
//! remaining sections are checked by the validator and otherwise ignored.

use crate::models::Ipv4;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Resource families that must carry a boolean toggle.
pub const RESOURCE_TOGGLE_KEYS: [&str; 14] = [
    "logAnalytics",
    "applicationInsights",
    "virtualNetwork",
    "subnets",
    "firewall",
    "applicationGateway",
    "acr",
    "storage",
    "redis",
    "cosmosDatabase",
    "postgresDatabase",
    "keyVault",
    "aks",
    "maintenanceVm",
];

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub common: Identity,
    pub network: NetworkSettings,
    #[serde(default)]
    pub resource_toggles: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub location: String,
    pub environment_name: String,
    pub system_name: String,
    #[serde(default = "default_true")]
    pub enable_resource_lock: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    pub vnet_address_prefixes: Vec<Ipv4>,
    #[serde(default)]
    pub vnet_dns_servers: Vec<String>,
    #[serde(default)]
    pub shared_bastion_ip: String,
    #[serde(default)]
    pub egress_next_hop_ip: String,
    #[serde(default)]
    pub enable_firewall_idps: bool,
    #[serde(default = "default_true")]
    pub enable_ddos_protection: bool,
    #[serde(default)]
    pub ddos_protection_plan_id: String,
}

impl Settings {
    /// Deploy flag for a resource family. Absent toggles default to true.
    pub fn toggle(&self, key: &str) -> bool {
        self.resource_toggles.get(key).copied().unwrap_or(true)
    }

    /// Externally supplied bastion address, if any.
    pub fn shared_bastion_ip(&self) -> Option<&str> {
        non_empty(&self.network.shared_bastion_ip)
    }

    /// Explicit egress next hop, if any.
    pub fn egress_next_hop_ip(&self) -> Option<&str> {
        non_empty(&self.network.egress_next_hop_ip)
    }

    /// `{prefix}-{environmentName}-{systemName}`
    pub fn resource_name(&self, prefix: &str) -> String {
        format!(
            "{prefix}-{}-{}",
            self.common.environment_name, self.common.system_name
        )
    }

    pub fn resource_group_name(&self, modules_name: &str) -> String {
        format!("{}-{modules_name}", self.resource_name("rg"))
    }

    pub fn vnet_name(&self) -> String {
        self.resource_name("vnet")
    }

    pub fn log_analytics_name(&self) -> String {
        self.resource_name("log")
    }

    pub fn log_analytics_resource_group_name(&self) -> String {
        self.resource_group_name("monitor")
    }

    /// Lock kind to emit; empty when resource locks are disabled.
    pub fn effective_lock_kind<'a>(&self, lock_kind: &'a str) -> &'a str {
        if self.common.enable_resource_lock {
            lock_kind
        } else {
            ""
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
