//! Route table and firewall side files.

use super::{default_lock_kind, default_modules_name};
use crate::models::Ipv4;
use serde::Deserialize;

fn default_ingress_subnet_alias() -> String {
    "agic".to_string()
}

fn default_firewall_subnet_alias() -> String {
    "firewall".to_string()
}

fn default_inbound_target_subnet_aliases() -> Vec<String> {
    vec!["usernode".to_string(), "agentnode".to_string()]
}

fn default_outbound_route_name() -> String {
    "udr-internet-outbound".to_string()
}

fn default_outbound_address_prefix() -> Ipv4 {
    Ipv4::from_u32(0, 0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTablesConfig {
    #[serde(default = "default_modules_name")]
    pub modules_name: String,
    #[serde(default = "default_lock_kind")]
    pub lock_kind: String,
    /// Externally facing subnet the ingress table is bound to.
    #[serde(default = "default_ingress_subnet_alias")]
    pub ingress_subnet_alias: String,
    /// Subnet hosting the firewall appliance.
    #[serde(default = "default_firewall_subnet_alias")]
    pub firewall_subnet_alias: String,
    #[serde(default = "default_inbound_target_subnet_aliases")]
    pub inbound_target_subnet_aliases: Vec<String>,
    #[serde(default)]
    pub outbound_subnet_aliases: Vec<String>,
    #[serde(default = "default_outbound_route_name")]
    pub outbound_route_name: String,
    #[serde(default = "default_outbound_address_prefix")]
    pub outbound_address_prefix: Ipv4,
}

impl Default for RouteTablesConfig {
    fn default() -> Self {
        RouteTablesConfig {
            modules_name: default_modules_name(),
            lock_kind: default_lock_kind(),
            ingress_subnet_alias: default_ingress_subnet_alias(),
            firewall_subnet_alias: default_firewall_subnet_alias(),
            inbound_target_subnet_aliases: default_inbound_target_subnet_aliases(),
            outbound_subnet_aliases: vec![],
            outbound_route_name: default_outbound_route_name(),
            outbound_address_prefix: default_outbound_address_prefix(),
        }
    }
}

/// Optional firewall settings. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirewallConfig {
    #[serde(rename = "modulesName")]
    pub modules_name: String,
    #[serde(rename = "lockKind")]
    pub lock_kind: String,
    #[serde(rename = "publicIPSku")]
    pub public_ip_sku: String,
    #[serde(rename = "publicIPAllocationMethod")]
    pub public_ip_allocation_method: String,
    #[serde(rename = "publicIPAddressVersion")]
    pub public_ip_address_version: String,
    #[serde(rename = "threatIntelMode")]
    pub threat_intel_mode: String,
    #[serde(rename = "intrusionDetectionMode")]
    pub intrusion_detection_mode: String,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        FirewallConfig {
            modules_name: default_modules_name(),
            lock_kind: default_lock_kind(),
            public_ip_sku: "Standard".to_string(),
            public_ip_allocation_method: "Static".to_string(),
            public_ip_address_version: "IPv4".to_string(),
            threat_intel_mode: "Deny".to_string(),
            intrusion_detection_mode: "Alert".to_string(),
        }
    }
}
