//! Route tables steering traffic through the firewall appliance.
//!
//! Two tables are built:
//! - `firewall`: bound to the ingress subnet, one route per protected subnet
//!   pointing at the firewall private address.
//! - `outbound`: a single default route bound to the configured egress
//!   subnets, pointing at the egress next hop or the firewall.

use super::alias::AliasResolver;
use crate::config::RouteTablesConfig;
use crate::error::{Error, Result};
use crate::models::{parse_ip, Route, RouteTable, NEXT_HOP_VIRTUAL_APPLIANCE};
use std::net::Ipv4Addr;

pub const INGRESS_TABLE_NAME: &str = "firewall";
pub const EGRESS_TABLE_NAME: &str = "outbound";

/// First usable host of the firewall subnet.
pub fn firewall_private_ip(resolver: &AliasResolver, firewall_alias: &str) -> Result<Ipv4Addr> {
    let prefix = resolver.prefix_of(firewall_alias).ok_or_else(|| {
        Error::resolution(format!("firewall subnet '{firewall_alias}' is not allocated"))
    })?;
    prefix
        .nth_host(0)
        .ok_or_else(|| Error::resolution(format!("no usable address in firewall subnet {prefix}")))
}

/// Route tables and the firewall address they point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub firewall_private_ip: Ipv4Addr,
    pub tables: Vec<RouteTable>,
}

impl RoutePlan {
    /// Name of the table bound to `alias`, if any.
    pub fn table_for(&self, alias: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|t| t.is_bound_to(alias))
            .map(|t| t.name.as_str())
    }
}

pub struct RouteTableBuilder<'a> {
    resolver: &'a AliasResolver,
    config: &'a RouteTablesConfig,
    egress_next_hop_ip: Option<&'a str>,
}

impl<'a> RouteTableBuilder<'a> {
    pub fn new(
        resolver: &'a AliasResolver,
        config: &'a RouteTablesConfig,
        egress_next_hop_ip: Option<&'a str>,
    ) -> RouteTableBuilder<'a> {
        RouteTableBuilder {
            resolver,
            config,
            egress_next_hop_ip,
        }
    }

    /// Keep the aliases that were allocated, in configured order.
    fn allocated_only(&self, aliases: &[String], what: &str) -> Vec<String> {
        aliases
            .iter()
            .filter(|alias| {
                let known = self.resolver.is_allocated(alias);
                if !known {
                    log::warn!("{what}: subnet alias '{alias}' is not allocated, dropping it");
                }
                known
            })
            .cloned()
            .collect()
    }

    fn egress_next_hop(&self, firewall_ip: Ipv4Addr) -> Result<Ipv4Addr> {
        match self.egress_next_hop_ip.map(str::trim).filter(|ip| !ip.is_empty()) {
            Some(ip) => parse_ip(ip).map_err(|_| {
                Error::resolution(format!("egressNextHopIp '{ip}' is not a valid IP address"))
            }),
            None => Ok(firewall_ip),
        }
    }

    pub fn build(&self) -> Result<RoutePlan> {
        let firewall_ip = firewall_private_ip(self.resolver, &self.config.firewall_subnet_alias)?;

        let ingress_alias = &self.config.ingress_subnet_alias;
        if !self.resolver.is_allocated(ingress_alias) {
            return Err(Error::resolution(format!(
                "ingress subnet '{ingress_alias}' is not allocated"
            )));
        }
        let next_hop = self.egress_next_hop(firewall_ip)?;

        let inbound_targets = self.allocated_only(
            &self.config.inbound_target_subnet_aliases,
            "inboundTargetSubnetAliases",
        );
        if inbound_targets.is_empty() {
            return Err(Error::resolution(
                "inboundTargetSubnetAliases has no allocated subnet",
            ));
        }

        let mut inbound_routes = Vec::with_capacity(inbound_targets.len());
        for alias in &inbound_targets {
            let prefix = self.resolver.prefix_of(alias).ok_or_else(|| {
                Error::resolution(format!("no prefix for inbound target '{alias}'"))
            })?;
            inbound_routes.push(Route {
                name: format!("udr-{alias}-inbound"),
                address_prefix: prefix.to_string(),
                next_hop_type: NEXT_HOP_VIRTUAL_APPLIANCE.to_string(),
                next_hop_ip_address: firewall_ip,
            });
        }

        let egress_members = self.allocated_only(
            &self.config.outbound_subnet_aliases,
            "outboundSubnetAliases",
        );

        let tables = vec![
            RouteTable {
                name: INGRESS_TABLE_NAME.to_string(),
                routes: inbound_routes,
                subnet_names: vec![ingress_alias.clone()],
            },
            RouteTable {
                name: EGRESS_TABLE_NAME.to_string(),
                routes: vec![Route {
                    name: self.config.outbound_route_name.clone(),
                    address_prefix: self.config.outbound_address_prefix.to_string(),
                    next_hop_type: NEXT_HOP_VIRTUAL_APPLIANCE.to_string(),
                    next_hop_ip_address: next_hop,
                }],
                subnet_names: egress_members,
            },
        ];

        log::info!(
            "Built {} route table(s), firewall {firewall_ip}, egress next hop {next_hop}",
            tables.len()
        );
        Ok(RoutePlan {
            firewall_private_ip: firewall_ip,
            tables,
        })
    }
}
