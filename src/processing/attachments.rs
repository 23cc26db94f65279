//! Which security group and route table each subnet is attached to.

use super::routes::RoutePlan;
use crate::config::Settings;
use crate::models::{AllocatedSubnet, Ipv4, NetworkSecurityGroup};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetAttachment {
    pub name: String,
    pub alias: String,
    pub address_prefix: Ipv4,
    /// Empty when the subnet has no security group.
    pub network_security_group_name: String,
    /// Empty when the subnet is not bound to a route table.
    pub route_table_name: String,
}

/// One attachment per allocated subnet, except the firewall subnet which
/// Azure manages itself.
pub fn subnet_attachments(
    settings: &Settings,
    allocated: &[AllocatedSubnet],
    nsgs: &[NetworkSecurityGroup],
    routes: &RoutePlan,
    firewall_alias: &str,
) -> Vec<SubnetAttachment> {
    let attachments: Vec<SubnetAttachment> = allocated
        .iter()
        .filter(|s| s.alias != firewall_alias)
        .map(|s| {
            let has_nsg = nsgs.iter().any(|n| n.subnet_alias == s.alias);
            SubnetAttachment {
                name: s.name.clone(),
                alias: s.alias.clone(),
                address_prefix: s.address_prefix,
                network_security_group_name: if has_nsg {
                    format!("{}-{}", settings.resource_name("nsg"), s.alias)
                } else {
                    String::new()
                },
                route_table_name: routes
                    .table_for(&s.alias)
                    .map(|table| format!("{}-{table}", settings.resource_name("rt")))
                    .unwrap_or_default(),
            }
        })
        .collect();
    log::info!("Prepared {} subnet attachment(s)", attachments.len());
    attachments
}
