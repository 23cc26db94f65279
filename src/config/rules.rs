//! Security rule template file.

use super::{default_lock_kind, default_modules_name};
use crate::error::{Error, Result};
use crate::models::RuleSpec;
use serde::Deserialize;
use std::collections::BTreeMap;

fn default_excluded_subnet_aliases() -> Vec<String> {
    ["agic", "firewall", "bastion"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Azure service tags accepted verbatim as rule peers.
fn default_service_tags() -> Vec<String> {
    [
        "Internet",
        "VirtualNetwork",
        "AzureLoadBalancer",
        "GatewayManager",
        "AzureCloud",
        "AzureMonitor",
        "Storage",
        "Sql",
        "AzureKeyVault",
        "AzureContainerRegistry",
        "AzureActiveDirectory",
        "AzureFrontDoor.Backend",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsgConfig {
    #[serde(default = "default_modules_name")]
    pub modules_name: String,
    #[serde(default = "default_lock_kind")]
    pub lock_kind: String,
    /// Subnets that never get a security group.
    #[serde(default = "default_excluded_subnet_aliases")]
    pub excluded_subnet_aliases: Vec<String>,
    #[serde(default = "default_service_tags")]
    pub service_tags: Vec<String>,
    /// Additional named selectors; `maintBastion` is always available.
    #[serde(default)]
    pub selectors: BTreeMap<String, SelectorConfig>,
    #[serde(default)]
    pub templates: Vec<RuleTemplate>,
}

/// Selector slot: an optional external address with a fallback subnet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    #[serde(default)]
    pub override_ip: Option<String>,
    pub fallback_subnet: String,
}

/// Rules for one subnet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTemplate {
    pub target_subnet: Option<String>,
    #[serde(alias = "targetNsgRule")]
    pub legacy_target: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// How a template names the subnet it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateTarget {
    Alias(String),
    Legacy(String),
}

impl RuleTemplate {
    pub fn target(&self) -> Result<TemplateTarget> {
        match (&self.target_subnet, &self.legacy_target) {
            (Some(alias), None) => Ok(TemplateTarget::Alias(alias.clone())),
            (None, Some(token)) => Ok(TemplateTarget::Legacy(token.clone())),
            (Some(alias), Some(token)) => Err(Error::Config(format!(
                "rule template sets both targetSubnet '{alias}' and legacyTarget '{token}'"
            ))),
            (None, None) => Err(Error::Config(
                "rule template needs targetSubnet or legacyTarget".to_string(),
            )),
        }
    }
}

impl NsgConfig {
    pub fn is_excluded(&self, alias: &str) -> bool {
        self.excluded_subnet_aliases.iter().any(|a| a == alias)
    }
}
