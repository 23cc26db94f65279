//! Pre-flight validation of the raw input documents.
//!
//! Every independent problem is collected so the operator can fix the whole
//! document in one go. Nothing downstream runs on invalid input.
//!
//! - [`checks`] - field-level primitives
//! - `network` - identity, network and toggle sections
//! - `aks`, `postgres`, `redis`, `cosmos` - workload sections
//! - `subnets` - subnet definitions

mod aks;
pub mod checks;
mod cosmos;
mod network;
mod postgres;
mod redis;
mod subnets;

pub use aks::MIN_SERVICE_CIDR_HOSTS;
pub use checks::{Section, Validator};
pub use cosmos::min_retention_hours;
pub use subnets::{MAX_PREFIX_LENGTH, MIN_PREFIX_LENGTH};

use crate::error::{Error, Result};
use serde_json::Value;

/// Validate the common parameter document and the subnet definitions.
/// An empty list means valid.
pub fn validate(common: &Value, subnet_doc: &Value) -> Vec<String> {
    let mut v = Validator::new();
    let root = Section::root(common);

    if root.is_object() {
        let identity = v.section(&root, "common");
        let network = v.section(&root, "network");
        let aks = v.section(&root, "aks");
        let postgres = v.section(&root, "postgres");
        let redis = v.section(&root, "redis");
        let cosno = v.section(&root, "cosno");

        network::check_identity(&mut v, &identity);
        let vnet_prefixes = network::check_network(&mut v, &network);
        aks::check_aks(&mut v, &aks, &vnet_prefixes);
        postgres::check_postgres(&mut v, &postgres);
        redis::check_redis(&mut v, &redis);
        cosmos::check_cosmos(&mut v, &cosno);
        network::check_toggles(&mut v, &root);
    } else {
        v.error("common parameters", "top level must be an object");
    }

    subnets::check_subnets(&mut v, subnet_doc);

    let errors = v.finish();
    log::info!("Validation finished with {} error(s)", errors.len());
    errors
}

/// [`validate`], turning any findings into [`Error::Validation`].
pub fn ensure_valid(common: &Value, subnet_doc: &Value) -> Result<()> {
    let errors = validate(common, subnet_doc);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}
