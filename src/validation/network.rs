//! Identity, network and resource toggle sections.

use super::checks::{Section, Validator};
use crate::config::RESOURCE_TOGGLE_KEYS;
use crate::models::Ipv4;
use crate::processing::find_overlapping_ranges;
use serde_json::Value;

pub(super) fn check_identity(v: &mut Validator, common: &Section) {
    v.non_empty_str(common, "location");
    v.non_empty_str(common, "environmentName");
    v.non_empty_str(common, "systemName");
    v.bool(common, "enableResourceLock");
}

/// Returns the base address ranges that parsed, for later cross-checks.
pub(super) fn check_network(v: &mut Validator, network: &Section) -> Vec<Ipv4> {
    v.bool(network, "enableFirewallIdps");
    let enable_ddos = v.bool(network, "enableDdosProtection");
    v.bool(network, "enableGatewayRoutePropagation");
    v.bool(network, "enableCentralizedPrivateDns");

    let plan_path = network.path("ddosProtectionPlanId");
    match network.get("ddosProtectionPlanId") {
        Some(Value::String(plan_id)) => {
            if enable_ddos == Some(true)
                && !plan_id.is_empty()
                && !plan_id.starts_with("/subscriptions/")
            {
                v.error(
                    &plan_path,
                    "must be an Azure resource id (/subscriptions/...) when set",
                );
            }
        }
        _ => v.error(&plan_path, "must be a string (empty when unset)"),
    }

    let prefixes_path = network.path("vnetAddressPrefixes");
    let mut prefixes = Vec::new();
    match network.get("vnetAddressPrefixes") {
        Some(Value::Array(items)) if !items.is_empty() => {
            for (i, raw) in items.iter().enumerate() {
                if let Some(cidr) = v.cidr_value(Some(raw), &format!("{prefixes_path}[{i}]")) {
                    prefixes.push(cidr);
                }
            }
            for conflict in find_overlapping_ranges(&prefixes) {
                v.error(
                    &prefixes_path,
                    format!(
                        "ranges overlap ({} and {})",
                        conflict.first, conflict.second
                    ),
                );
            }
        }
        _ => v.error(&prefixes_path, "must be an array of one or more CIDRs"),
    }

    v.optional_ip(network, "egressNextHopIp");
    v.optional_ip_or_cidr(network, "sharedBastionIp");

    let dns_path = network.path("vnetDnsServers");
    match network.get("vnetDnsServers") {
        Some(Value::Array(items)) => {
            for (i, raw) in items.iter().enumerate() {
                v.optional_ip_value(Some(raw), &format!("{dns_path}[{i}]"));
            }
        }
        _ => v.error(&dns_path, "must be an array of IPv4 addresses (empty when unset)"),
    }

    prefixes
}

/// Every resource family needs an explicit on/off switch.
pub(super) fn check_toggles(v: &mut Validator, root: &Section) {
    let toggles = v.section(root, "resourceToggles");
    if !toggles.is_object() {
        return;
    }
    for key in RESOURCE_TOGGLE_KEYS {
        match toggles.get(key) {
            None => v.error(&toggles.path(key), "is not set; use true or false"),
            Some(Value::Bool(_)) => {}
            Some(_) => v.error(&toggles.path(key), "must be true or false"),
        }
    }
}
