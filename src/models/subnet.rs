//! Subnet definitions and allocation results.

use super::Ipv4;
use serde::Serialize;

/// Canonical subnet request, produced once at load time from either
/// configuration generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetDefinition {
    /// Full resource name, e.g. `AzureFirewallSubnet`.
    pub name: String,
    /// Stable logical identifier used by rules and routes.
    pub alias: String,
    /// Requested prefix length.
    pub prefix_length: u8,
    /// Reference key from the older name + token schema.
    pub legacy_token: Option<String>,
}

/// A subnet with its assigned address prefix. Never mutated after allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedSubnet {
    pub name: String,
    pub alias: String,
    pub address_prefix: Ipv4,
}

impl std::fmt::Display for AllocatedSubnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) {}", self.alias, self.name, self.address_prefix)
    }
}
