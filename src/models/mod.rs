//! Domain models for the network parameter compiler.
//!
//! This module contains the value types passed between pipeline stages:
//! - [`Ipv4`] - IPv4 address with CIDR notation support
//! - [`SubnetDefinition`] and [`AllocatedSubnet`] - subnet requests and results
//! - [`RuleSpec`] and [`ResolvedRule`] - security rules before and after resolution
//! - [`RouteTable`] - user-defined route tables

mod ipv4;
mod route;
mod rule;
mod subnet;

// Re-export public types
pub use ipv4::{
    is_ip_or_cidr, lo_mask, num_az_hosts, parse_ip, CidrError, Ipv4, AZURE_RESERVED_HOSTS,
    MAX_LENGTH,
};
pub use route::{Route, RouteTable, NEXT_HOP_VIRTUAL_APPLIANCE};
pub use rule::{
    AddressPrefixes, Direction, NetworkSecurityGroup, Peer, PortRanges, ResolvedRule, RuleSpec,
};
pub use subnet::{AllocatedSubnet, SubnetDefinition};
