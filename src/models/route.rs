//! Route table types.

use std::net::Ipv4Addr;

/// Next hop type for routes through the firewall appliance.
pub const NEXT_HOP_VIRTUAL_APPLIANCE: &str = "VirtualAppliance";

/// A single user-defined route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub address_prefix: String,
    pub next_hop_type: String,
    pub next_hop_ip_address: Ipv4Addr,
}

/// Named route table and the subnet aliases it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub name: String,
    pub routes: Vec<Route>,
    pub subnet_names: Vec<String>,
}

impl RouteTable {
    pub fn is_bound_to(&self, alias: &str) -> bool {
        self.subnet_names.iter().any(|s| s == alias)
    }
}
