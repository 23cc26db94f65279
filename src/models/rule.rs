//! Security rule templates and their resolved form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Traffic direction of a security rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "Inbound"),
            Direction::Outbound => write!(f, "Outbound"),
        }
    }
}

/// One side of a rule: a single token or a list of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Peer {
    One(String),
    Many(Vec<String>),
}

impl Peer {
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Peer::One(t) => vec![t.as_str()],
            Peer::Many(ts) => ts.iter().map(String::as_str).collect(),
        }
    }
}

/// Destination ports: scalar range or a list of ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRanges {
    One(String),
    Many(Vec<String>),
}

/// Declarative rule as written in the template file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSpec {
    pub name: Option<String>,
    pub direction: Option<Direction>,
    pub source: Option<Peer>,
    pub destination: Option<Peer>,
    pub source_selector: Option<String>,
    pub protocol: Option<String>,
    pub source_port_range: Option<String>,
    pub destination_port_range: Option<String>,
    pub destination_port_ranges: Option<Vec<String>>,
    pub access: Option<String>,
    pub priority: Option<u32>,
}

/// Address side of a resolved rule. Emitted as either the scalar
/// `...AddressPrefix` field or the `...AddressPrefixes` array, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressPrefixes {
    One(String),
    Many(Vec<String>),
}

/// Fully literal security rule, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub name: String,
    pub source: AddressPrefixes,
    pub source_port_range: String,
    pub destination: AddressPrefixes,
    pub destination_ports: PortRanges,
    pub protocol: String,
    pub access: String,
    pub priority: u32,
    pub direction: Direction,
}

/// Security rules for one subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSecurityGroup {
    pub subnet_alias: String,
    pub rules: Vec<ResolvedRule>,
}
