//! Security rule template expansion.
//!
//! Each allocated subnet outside the excluded set gets one security group.
//! Templates supply its rules; every peer must resolve to an address, a
//! service tag or an allocated subnet prefix.

use super::alias::{AliasResolver, Resolved, ANY};
use crate::config::{NsgConfig, TemplateTarget};
use crate::error::{Error, Result};
use crate::models::{
    AddressPrefixes, AllocatedSubnet, Direction, NetworkSecurityGroup, Peer, PortRanges,
    ResolvedRule, RuleSpec,
};
use std::collections::HashMap;

pub const DEFAULT_PRIORITY: u32 = 100;
pub const DEFAULT_ACCESS: &str = "Allow";
/// Suffix carried by aliases taken over from legacy tokens.
pub const LEGACY_SUFFIX: &str = "-nsg";

/// Display form of one peer for generated rule names.
pub fn format_peer(value: &str) -> String {
    if value == ANY {
        return "Any".to_string();
    }
    let value = value.strip_suffix(LEGACY_SUFFIX).unwrap_or(value);
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A peer after resolution: the address field value and the name shown in
/// generated rule names.
struct ResolvedPeer {
    addresses: AddressPrefixes,
    display: String,
}

pub struct RuleTemplateExpander<'a> {
    resolver: &'a AliasResolver,
    config: &'a NsgConfig,
}

impl<'a> RuleTemplateExpander<'a> {
    pub fn new(resolver: &'a AliasResolver, config: &'a NsgConfig) -> RuleTemplateExpander<'a> {
        RuleTemplateExpander { resolver, config }
    }

    /// Map each template to the alias of the subnet it applies to.
    /// Templates for excluded or missing-but-excluded subnets are skipped.
    fn templates_by_alias(&self) -> Result<HashMap<String, Vec<&'a RuleSpec>>> {
        let config = self.config;
        let mut by_alias: HashMap<String, Vec<&'a RuleSpec>> = HashMap::new();
        for template in &config.templates {
            let alias = match template.target()? {
                TemplateTarget::Alias(alias) => alias,
                TemplateTarget::Legacy(token) => {
                    log::warn!("Template target '{token}' uses a legacy token, use targetSubnet");
                    self.resolver
                        .alias_for_token(&token)
                        .unwrap_or(&token)
                        .to_string()
                }
            };
            if config.is_excluded(&alias) {
                log::debug!("Skipping template for excluded subnet '{alias}'");
                continue;
            }
            let alias = match self.resolver.lookup(&alias) {
                Some(found) => found.to_string(),
                None => {
                    return Err(Error::resolution(format!(
                        "rule template targets unknown subnet '{alias}'"
                    )))
                }
            };
            by_alias
                .entry(alias)
                .or_default()
                .extend(template.rules.iter());
        }
        Ok(by_alias)
    }

    /// One security group per allocated, non-excluded subnet, in allocation order.
    pub fn expand(&self, allocated: &[AllocatedSubnet]) -> Result<Vec<NetworkSecurityGroup>> {
        let templates = self.templates_by_alias()?;
        let mut nsgs = Vec::new();
        for subnet in allocated {
            if self.config.is_excluded(&subnet.alias) {
                log::debug!("No security group for excluded subnet '{}'", subnet.alias);
                continue;
            }
            let rules = templates
                .get(&subnet.alias)
                .map(|specs| {
                    specs
                        .iter()
                        .map(|spec| self.expand_rule(spec, &subnet.alias))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default();
            log::debug!("Security group for '{}' has {} rule(s)", subnet.alias, rules.len());
            nsgs.push(NetworkSecurityGroup {
                subnet_alias: subnet.alias.clone(),
                rules,
            });
        }
        log::info!(
            "Expanded {} security group(s) with {} rule(s)",
            nsgs.len(),
            nsgs.iter().map(|n| n.rules.len()).sum::<usize>()
        );
        Ok(nsgs)
    }

    /// Expand one rule for the subnet `owner`.
    pub fn expand_rule(&self, spec: &RuleSpec, owner: &str) -> Result<ResolvedRule> {
        let direction = spec.direction.unwrap_or_default();
        let access = spec.access.clone().unwrap_or_else(|| DEFAULT_ACCESS.to_string());
        let owner_peer = || Peer::One(owner.to_string());
        let any_peer = || Peer::One(ANY.to_string());

        // Outbound rules without an explicit source always leave the owner.
        let selector = match (&spec.source_selector, &spec.source, direction) {
            (Some(_), None, Direction::Outbound) => {
                log::debug!("Outbound rule on '{owner}': sourceSelector ignored, source is the subnet");
                None
            }
            (selector, _, _) => selector.as_ref(),
        };
        let source = match selector {
            Some(selector) => ResolvedPeer {
                addresses: AddressPrefixes::One(self.resolver.resolve_selector(selector)?),
                display: format_peer(selector),
            },
            None => {
                let peer = match (&spec.source, direction) {
                    (Some(peer), _) => peer.clone(),
                    (None, Direction::Outbound) => owner_peer(),
                    (None, Direction::Inbound) => any_peer(),
                };
                self.resolve_peer(&peer, owner, "source", spec)?
            }
        };
        let destination_peer = match (&spec.destination, direction) {
            (Some(peer), _) => peer.clone(),
            (None, Direction::Inbound) => owner_peer(),
            (None, Direction::Outbound) => any_peer(),
        };
        let destination = self.resolve_peer(&destination_peer, owner, "destination", spec)?;

        let name = match &spec.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => match direction {
                Direction::Inbound => format!("{access}From{}", source.display),
                Direction::Outbound => format!("{access}To{}", destination.display),
            },
        };

        let destination_ports = match &spec.destination_port_ranges {
            Some(ranges) => {
                if spec.destination_port_range.is_some() {
                    log::debug!("Rule '{name}': destinationPortRanges replaces destinationPortRange");
                }
                PortRanges::Many(ranges.clone())
            }
            None => PortRanges::One(
                spec.destination_port_range
                    .clone()
                    .unwrap_or_else(|| ANY.to_string()),
            ),
        };

        log::trace!("Expanded rule '{name}' for '{owner}'");
        Ok(ResolvedRule {
            name,
            source: source.addresses,
            source_port_range: spec
                .source_port_range
                .clone()
                .unwrap_or_else(|| ANY.to_string()),
            destination: destination.addresses,
            destination_ports,
            protocol: spec.protocol.clone().unwrap_or_else(|| ANY.to_string()),
            access,
            priority: spec.priority.unwrap_or(DEFAULT_PRIORITY),
            direction,
        })
    }

    fn resolve_peer(&self, peer: &Peer, owner: &str, side: &str, spec: &RuleSpec) -> Result<ResolvedPeer> {
        let rule = spec
            .name
            .as_deref()
            .map(|n| format!("'{n}' "))
            .unwrap_or_default();
        let tokens = peer.tokens();
        if tokens.is_empty() {
            return Err(Error::resolution(format!(
                "rule {rule}on subnet '{owner}': {side} is an empty list"
            )));
        }
        let mut addresses = Vec::new();
        let mut display = String::new();
        for token in tokens {
            let resolved = self.resolver.resolve(token, owner);
            let Some(address) = resolved.address() else {
                return Err(Error::resolution(format!(
                    "rule {rule}on subnet '{owner}': {side} '{token}' is not an address, service tag or subnet"
                )));
            };
            display.push_str(&match &resolved {
                Resolved::Subnet { alias, .. } => format_peer(alias),
                _ => format_peer(token.trim()),
            });
            addresses.push(address);
        }
        let addresses = match peer {
            Peer::One(_) => match addresses.pop() {
                Some(address) => AddressPrefixes::One(address),
                None => AddressPrefixes::Many(vec![]),
            },
            Peer::Many(_) => AddressPrefixes::Many(addresses),
        };
        Ok(ResolvedPeer { addresses, display })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ipv4, SubnetDefinition};
    use crate::processing::alias::{Selector, MAINT_BASTION_SELECTOR};
    use serde_json::json;

    fn fixture() -> (Vec<SubnetDefinition>, Vec<AllocatedSubnet>) {
        let rows = [
            ("snet-web", "web", None, "10.0.0.0/24"),
            ("AzureFirewallSubnet", "firewall", None, "10.0.1.0/26"),
            ("snet-db", "db-nsg", Some("db-nsg"), "10.0.2.0/27"),
            ("snet-agic", "agic", None, "10.0.3.0/27"),
        ];
        let defs = rows
            .iter()
            .map(|(name, alias, token, _)| SubnetDefinition {
                name: name.to_string(),
                alias: alias.to_string(),
                prefix_length: 24,
                legacy_token: token.map(str::to_string),
            })
            .collect();
        let alloc = rows
            .iter()
            .map(|(name, alias, _, prefix)| AllocatedSubnet {
                name: name.to_string(),
                alias: alias.to_string(),
                address_prefix: Ipv4::new(prefix).unwrap(),
            })
            .collect();
        (defs, alloc)
    }

    fn resolver() -> AliasResolver {
        let (defs, alloc) = fixture();
        AliasResolver::new(&defs, &alloc)
            .with_service_tags(["Internet", "AzureLoadBalancer"])
            .with_selector(
                MAINT_BASTION_SELECTOR,
                Selector {
                    override_ip: Some("192.168.50.4".into()),
                    fallback_alias: "bastion".into(),
                },
            )
    }

    fn nsg_config(value: serde_json::Value) -> NsgConfig {
        serde_json::from_value(value).unwrap()
    }

    fn spec(value: serde_json::Value) -> RuleSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_peer() {
        assert_eq!(format_peer("*"), "Any");
        assert_eq!(format_peer("firewall"), "Firewall");
        assert_eq!(format_peer("db-nsg"), "Db");
        assert_eq!(format_peer("maintBastion"), "MaintBastion");
        assert_eq!(format_peer(""), "");
    }

    #[test]
    fn test_inbound_from_any() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let rule = expander
            .expand_rule(&spec(json!({"direction": "Inbound", "source": "*"})), "web")
            .unwrap();
        assert_eq!(rule.name, "AllowFromAny");
        assert_eq!(rule.source, AddressPrefixes::One("*".into()));
        assert_eq!(rule.destination, AddressPrefixes::One("10.0.0.0/24".into()));
        assert_eq!(rule.destination_ports, PortRanges::One("*".into()));
        assert_eq!(rule.protocol, "*");
        assert_eq!(rule.source_port_range, "*");
        assert_eq!(rule.priority, 100);
        assert_eq!(rule.access, "Allow");
        assert_eq!(rule.direction, Direction::Inbound);
    }

    #[test]
    fn test_outbound_to_firewall() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let rule = expander
            .expand_rule(
                &spec(json!({"direction": "Outbound", "destination": "firewall"})),
                "web",
            )
            .unwrap();
        assert_eq!(rule.name, "AllowToFirewall");
        assert_eq!(rule.source, AddressPrefixes::One("10.0.0.0/24".into()));
        assert_eq!(rule.destination, AddressPrefixes::One("10.0.1.0/26".into()));
    }

    #[test]
    fn test_list_peers_and_ports() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let rule = expander
            .expand_rule(
                &spec(json!({
                    "source": ["@ref:db-nsg", "AzureLoadBalancer"],
                    "destinationPortRange": "80",
                    "destinationPortRanges": ["80", "443"],
                    "access": "Deny",
                    "priority": 4000,
                    "protocol": "Tcp"
                })),
                "web",
            )
            .unwrap();
        assert_eq!(rule.name, "DenyFromDbAzureLoadBalancer");
        assert_eq!(
            rule.source,
            AddressPrefixes::Many(vec!["10.0.2.0/27".into(), "AzureLoadBalancer".into()])
        );
        assert_eq!(
            rule.destination_ports,
            PortRanges::Many(vec!["80".into(), "443".into()])
        );
        assert_eq!(rule.priority, 4000);
    }

    #[test]
    fn test_selector_and_explicit_name() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let rule = expander
            .expand_rule(
                &spec(json!({"sourceSelector": "maintBastion", "destinationPortRange": "22"})),
                "web",
            )
            .unwrap();
        assert_eq!(rule.name, "AllowFromMaintBastion");
        assert_eq!(rule.source, AddressPrefixes::One("192.168.50.4".into()));

        let rule = expander
            .expand_rule(&spec(json!({"name": "Ssh", "source": "web"})), "db-nsg")
            .unwrap();
        assert_eq!(rule.name, "Ssh");
    }

    #[test]
    fn test_outbound_selector_keeps_owner_source() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let rule = expander
            .expand_rule(
                &spec(json!({
                    "direction": "Outbound",
                    "sourceSelector": "maintBastion",
                    "destination": "*"
                })),
                "web",
            )
            .unwrap();
        assert_eq!(rule.source, AddressPrefixes::One("10.0.0.0/24".into()));
        assert_eq!(rule.name, "AllowToAny");

        // an explicit source lets the selector apply again
        let rule = expander
            .expand_rule(
                &spec(json!({
                    "direction": "Outbound",
                    "sourceSelector": "maintBastion",
                    "source": "web",
                    "destination": "*"
                })),
                "web",
            )
            .unwrap();
        assert_eq!(rule.source, AddressPrefixes::One("192.168.50.4".into()));
    }

    #[test]
    fn test_empty_peer_list_is_fatal() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let err = expander
            .expand_rule(&spec(json!({"source": []})), "web")
            .unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert!(err.to_string().contains("source is an empty list"), "{err}");

        let err = expander
            .expand_rule(
                &spec(json!({"direction": "Outbound", "destination": []})),
                "web",
            )
            .unwrap_err();
        assert!(err.to_string().contains("destination is an empty list"), "{err}");
    }

    #[test]
    fn test_unresolved_peer_is_fatal() {
        let r = resolver();
        let cfg = nsg_config(json!({}));
        let expander = RuleTemplateExpander::new(&r, &cfg);
        let err = expander
            .expand_rule(&spec(json!({"source": "wbe"})), "web")
            .unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert!(err.to_string().contains("'wbe'"), "{err}");
    }

    #[test]
    fn test_expand_groups() {
        let r = resolver();
        let (_, alloc) = fixture();
        let cfg = nsg_config(json!({
            "templates": [
                {"targetSubnet": "web", "rules": [{"source": "Internet", "priority": 200}]},
                {"targetNsgRule": "db-nsg", "rules": [{"source": "web"}]},
                {"targetSubnet": "agic", "rules": [{"source": "*"}]}
            ]
        }));
        let nsgs = RuleTemplateExpander::new(&r, &cfg).expand(&alloc).unwrap();
        let aliases: Vec<&str> = nsgs.iter().map(|n| n.subnet_alias.as_str()).collect();
        assert_eq!(aliases, vec!["web", "db-nsg"]);
        assert_eq!(nsgs[0].rules[0].name, "AllowFromInternet");
        assert_eq!(nsgs[1].rules[0].name, "AllowFromWeb");
        assert_eq!(
            nsgs[1].rules[0].destination,
            AddressPrefixes::One("10.0.2.0/27".into())
        );
    }

    #[test]
    fn test_unknown_template_target() {
        let r = resolver();
        let (_, alloc) = fixture();
        let cfg = nsg_config(json!({
            "templates": [{"targetSubnet": "api", "rules": []}]
        }));
        let err = RuleTemplateExpander::new(&r, &cfg).expand(&alloc).unwrap_err();
        assert!(err.to_string().contains("unknown subnet 'api'"));
    }

    #[test]
    fn test_subnet_without_template_gets_empty_group() {
        let r = resolver();
        let (_, alloc) = fixture();
        let cfg = nsg_config(json!({}));
        let nsgs = RuleTemplateExpander::new(&r, &cfg).expand(&alloc).unwrap();
        assert_eq!(nsgs.len(), 2);
        assert!(nsgs.iter().all(|n| n.rules.is_empty()));
    }
}
