//! Input documents and typed configuration.
//!
//! This module handles everything read from disk:
//! - [`loader`] - file reading and environment variable paths
//! - [`settings`] - typed common parameters
//! - [`subnets`] - subnet definitions and generation normalization
//! - [`rules`] - security rule templates
//! - [`routes`] - route table and firewall settings

mod loader;
mod routes;
mod rules;
mod settings;
mod subnets;

// Re-export public types and functions
pub use loader::{
    load, parse, read_json, InputPaths, Inputs, OutputDirs, ENV_COMMON_FILE,
    ENV_FIREWALL_CONFIG_FILE, ENV_META_DIR, ENV_NSGS_CONFIG_FILE, ENV_PARAMS_DIR,
    ENV_ROUTE_TABLES_CONFIG_FILE, ENV_SUBNETS_CONFIG_FILE,
};
pub use routes::{FirewallConfig, RouteTablesConfig};
pub use rules::{NsgConfig, RuleTemplate, SelectorConfig, TemplateTarget};
pub use settings::{Identity, NetworkSettings, Settings, RESOURCE_TOGGLE_KEYS};
pub use subnets::{Generation, SubnetEntry, SubnetsConfig, BASTION_ALIAS};

pub(crate) fn default_modules_name() -> String {
    "nw".to_string()
}

pub(crate) fn default_lock_kind() -> String {
    "CanNotDelete".to_string()
}
