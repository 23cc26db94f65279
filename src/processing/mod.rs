//! Network compilation logic.
//!
//! This module contains the pipeline stages between loading and emission:
//! - [`allocator`] - packing subnet requests into the base ranges
//! - [`alias`] - resolving subnet references in rules and routes
//! - [`rules`] - expanding security rule templates
//! - [`routes`] - building the firewall route tables
//! - [`attachments`] - binding subnets to security groups and route tables
//! - [`gap_finder`] - free space left after allocation
//! - [`overlap`] - overlapping CIDR detection

pub mod alias;
mod allocator;
mod attachments;
mod gap_finder;
mod overlap;
mod routes;
mod rules;

// Re-export public types and functions
pub use alias::{AliasResolver, Resolved, Selector, ANY, MAINT_BASTION_SELECTOR, SELF_TOKEN};
pub use allocator::allocate;
pub use attachments::{subnet_attachments, SubnetAttachment};
pub use gap_finder::{find_free_blocks, FreeBlock};
pub use overlap::{find_overlapping_ranges, log_overlapping_ranges, OverlapConflict};
pub use routes::{
    firewall_private_ip, RoutePlan, RouteTableBuilder, EGRESS_TABLE_NAME, INGRESS_TABLE_NAME,
};
pub use rules::{format_peer, RuleTemplateExpander, DEFAULT_ACCESS, DEFAULT_PRIORITY};
