//! Parameter and metadata files, one pair per resource family.
//!
//! Every family writes `{params_dir}/{family}.bicepparam`, a `using` header
//! followed by `param` lines, and `{meta_dir}/{family}-meta.json` for the
//! deployment step.

use super::bicep::{param_line, quote};
use crate::config::OutputDirs;
use crate::error::{Error, Result};
use crate::models::{AddressPrefixes, PortRanges, ResolvedRule, RouteTable};
use crate::Compilation;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const FAMILY_VIRTUAL_NETWORK: &str = "virtual-network";
pub const FAMILY_SUBNETS: &str = "subnets";
pub const FAMILY_NSGS: &str = "nsgs";
pub const FAMILY_ROUTE_TABLES: &str = "route-tables";
pub const FAMILY_SUBNET_ATTACHMENTS: &str = "subnet-attachments";
pub const FAMILY_FIREWALL: &str = "firewall";

/// Contents of one family's output, before paths are known.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsDocument {
    pub family: &'static str,
    pub params: Vec<(&'static str, Value)>,
    /// Metadata written before `paramsFile`.
    pub meta: Map<String, Value>,
    /// Derived values written after `paramsFile`.
    pub derived: Map<String, Value>,
}

impl ParamsDocument {
    fn new(family: &'static str) -> ParamsDocument {
        ParamsDocument {
            family,
            params: Vec::new(),
            meta: Map::new(),
            derived: Map::new(),
        }
    }

    fn param(mut self, name: &'static str, value: impl Into<Value>) -> ParamsDocument {
        self.params.push((name, value.into()));
        self
    }

    fn meta(mut self, key: &str, value: impl Into<Value>) -> ParamsDocument {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    fn derived(mut self, key: &str, value: impl Into<Value>) -> ParamsDocument {
        self.derived.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// The `.bicepparam` text, newline terminated.
    pub fn render(&self) -> String {
        let mut lines = vec![format!(
            "using {}",
            quote(&format!("../bicep/main.{}.bicep", self.family))
        )];
        lines.extend(self.params.iter().map(|(name, value)| param_line(name, value)));
        lines.push(String::new());
        lines.join("\n")
    }

    /// The metadata document for a params file written to `params_path`.
    pub fn meta_document(&self, params_path: &Path) -> Value {
        let mut meta = self.meta.clone();
        meta.insert(
            "paramsFile".to_string(),
            Value::String(params_path.display().to_string()),
        );
        meta.extend(self.derived.clone());
        Value::Object(meta)
    }
}

/// Paths of one written family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub params_file: PathBuf,
    pub meta_file: PathBuf,
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a family's params and meta files.
pub fn write_document(dirs: &OutputDirs, doc: &ParamsDocument) -> Result<WrittenFiles> {
    let params_file = dirs.params_dir.join(format!("{}.bicepparam", doc.family));
    let meta_file = dirs.meta_dir.join(format!("{}-meta.json", doc.family));

    write_file(&params_file, &doc.render())?;
    let meta = serde_json::to_string_pretty(&doc.meta_document(&params_file))
        .map_err(|e| Error::Config(format!("Error serializing {} metadata: {e}", doc.family)))?;
    write_file(&meta_file, &format!("{meta}\n"))?;

    log::info!(
        "Wrote {} and {}",
        params_file.display(),
        meta_file.display()
    );
    Ok(WrittenFiles {
        params_file,
        meta_file,
    })
}

/// Identity params shared by most families.
fn with_identity(doc: ParamsDocument, c: &Compilation, modules_name: &str, lock_kind: &str) -> ParamsDocument {
    let common = &c.settings.common;
    doc.param("environmentName", common.environment_name.as_str())
        .param("systemName", common.system_name.as_str())
        .param("location", common.location.as_str())
        .param("modulesName", modules_name)
        .param("lockKind", c.settings.effective_lock_kind(lock_kind))
}

fn with_log_analytics(doc: ParamsDocument, c: &Compilation) -> ParamsDocument {
    doc.param("logAnalyticsName", c.settings.log_analytics_name())
        .param(
            "logAnalyticsResourceGroupName",
            c.settings.log_analytics_resource_group_name(),
        )
}

pub fn virtual_network(c: &Compilation) -> ParamsDocument {
    let s = &c.settings;
    let modules_name = &c.subnets.modules_name;
    let prefixes: Vec<String> = s
        .network
        .vnet_address_prefixes
        .iter()
        .map(ToString::to_string)
        .collect();
    let doc = with_identity(
        ParamsDocument::new(FAMILY_VIRTUAL_NETWORK),
        c,
        modules_name,
        &c.subnets.lock_kind,
    );
    with_log_analytics(doc, c)
        .param("vnetName", s.vnet_name())
        .param("vnetAddressPrefixes", prefixes)
        .param("vnetDnsServers", s.network.vnet_dns_servers.clone())
        .param("enableDdosProtection", s.network.enable_ddos_protection)
        .param("ddosProtectionPlanId", s.network.ddos_protection_plan_id.as_str())
        .param("ddosProtectionPlanName", s.resource_name("ddos"))
        .meta("location", s.common.location.as_str())
        .meta("resourceGroupName", s.resource_group_name(modules_name))
        .meta("deploy", s.toggle("virtualNetwork"))
}

pub fn subnets(c: &Compilation) -> ParamsDocument {
    let s = &c.settings;
    let subnets: Vec<Value> = c
        .allocated
        .iter()
        .map(|subnet| {
            let definition = c.definitions.iter().find(|d| d.alias == subnet.alias);
            let mut entry = Map::new();
            entry.insert("name".into(), json!(subnet.name));
            entry.insert("alias".into(), json!(subnet.alias));
            if let Some(def) = definition {
                entry.insert("prefixLength".into(), json!(def.prefix_length));
            }
            if let Some(props) = c.subnets.properties_for(&subnet.alias) {
                entry.extend(props.clone());
            }
            entry.insert("addressPrefix".into(), json!(subnet.address_prefix.to_string()));
            Value::Object(entry)
        })
        .collect();
    ParamsDocument::new(FAMILY_SUBNETS)
        .param("vnetName", s.vnet_name())
        .param("subnets", subnets)
        .meta("resourceGroupName", s.resource_group_name(&c.subnets.modules_name))
        .meta("vnetName", s.vnet_name())
        .meta("deploy", s.toggle("subnets"))
}

fn address_fields(props: &mut Map<String, Value>, side: &str, addresses: &AddressPrefixes) {
    match addresses {
        AddressPrefixes::One(a) => props.insert(format!("{side}AddressPrefix"), json!(a)),
        AddressPrefixes::Many(list) => props.insert(format!("{side}AddressPrefixes"), json!(list)),
    };
}

/// Azure security rule object.
pub fn rule_value(rule: &ResolvedRule) -> Value {
    let mut props = Map::new();
    address_fields(&mut props, "source", &rule.source);
    props.insert("sourcePortRange".into(), json!(rule.source_port_range));
    address_fields(&mut props, "destination", &rule.destination);
    match &rule.destination_ports {
        PortRanges::One(p) => props.insert("destinationPortRange".into(), json!(p)),
        PortRanges::Many(list) => props.insert("destinationPortRanges".into(), json!(list)),
    };
    props.insert("protocol".into(), json!(rule.protocol));
    props.insert("access".into(), json!(rule.access));
    props.insert("priority".into(), json!(rule.priority));
    props.insert("direction".into(), json!(rule.direction.to_string()));
    json!({"name": rule.name, "properties": props})
}

pub fn nsgs(c: &Compilation) -> ParamsDocument {
    let s = &c.settings;
    let cfg = &c.nsg_config;
    let nsgs: Vec<Value> = c
        .nsgs
        .iter()
        .map(|nsg| {
            let rules: Vec<Value> = nsg.rules.iter().map(rule_value).collect();
            json!({"subnetName": nsg.subnet_alias, "securityRules": rules})
        })
        .collect();
    let doc = with_identity(ParamsDocument::new(FAMILY_NSGS), c, &cfg.modules_name, &cfg.lock_kind);
    with_log_analytics(doc, c)
        .param("nsgs", nsgs)
        .meta("resourceGroupName", s.resource_group_name(&cfg.modules_name))
        .meta("deploy", s.toggle("subnets"))
}

fn route_table_value(table: &RouteTable) -> Value {
    let routes: Vec<Value> = table
        .routes
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "properties": {
                    "addressPrefix": r.address_prefix,
                    "nextHopType": r.next_hop_type,
                    "nextHopIpAddress": r.next_hop_ip_address.to_string(),
                }
            })
        })
        .collect();
    json!({"name": table.name, "routes": routes, "subnetNames": table.subnet_names})
}

pub fn route_tables(c: &Compilation) -> ParamsDocument {
    let s = &c.settings;
    let cfg = &c.route_config;
    let tables: Vec<Value> = c.routes.tables.iter().map(route_table_value).collect();
    with_identity(
        ParamsDocument::new(FAMILY_ROUTE_TABLES),
        c,
        &cfg.modules_name,
        &cfg.lock_kind,
    )
    .param("routeTables", tables)
    .meta("resourceGroupName", s.resource_group_name(&cfg.modules_name))
    .meta("deploy", s.toggle("subnets"))
}

pub fn subnet_attachments(c: &Compilation) -> ParamsDocument {
    let s = &c.settings;
    ParamsDocument::new(FAMILY_SUBNET_ATTACHMENTS)
        .param("vnetName", s.vnet_name())
        .param("subnets", json!(c.attachments))
        .meta("resourceGroupName", s.resource_group_name(&c.subnets.modules_name))
        .meta("deploy", s.toggle("subnets"))
}

pub fn firewall(c: &Compilation) -> ParamsDocument {
    let s = &c.settings;
    let cfg = &c.firewall_config;
    let protection_mode = if s.network.enable_ddos_protection {
        "Enabled"
    } else {
        "Disabled"
    };
    let doc = with_identity(ParamsDocument::new(FAMILY_FIREWALL), c, &cfg.modules_name, &cfg.lock_kind);
    with_log_analytics(doc, c)
        .param("vnetName", s.vnet_name())
        .param("enableFirewallIdps", s.network.enable_firewall_idps)
        .param("publicIPName", s.resource_name("pip-afw"))
        .param("firewallPolicyName", s.resource_name("afwp"))
        .param("firewallName", s.resource_name("afw"))
        .param("ipConfigurationName", s.resource_name("ipconf-afw"))
        .param("publicIPSku", cfg.public_ip_sku.as_str())
        .param("publicIPAllocationMethod", cfg.public_ip_allocation_method.as_str())
        .param("publicIPAddressVersion", cfg.public_ip_address_version.as_str())
        .param("protectionMode", protection_mode)
        .param("threatIntelMode", cfg.threat_intel_mode.as_str())
        .param("intrusionDetectionMode", cfg.intrusion_detection_mode.as_str())
        .meta("resourceGroupName", s.resource_group_name(&cfg.modules_name))
        .meta("deploy", s.toggle("firewall"))
        .derived("firewallPrivateIp", c.routes.firewall_private_ip.to_string())
}

/// Every family, in deployment order.
pub fn documents(c: &Compilation) -> Vec<ParamsDocument> {
    vec![
        virtual_network(c),
        subnets(c),
        nsgs(c),
        route_tables(c),
        subnet_attachments(c),
        firewall(c),
    ]
}

/// Write every family.
pub fn write_all(dirs: &OutputDirs, c: &Compilation) -> Result<Vec<WrittenFiles>> {
    let written = documents(c)
        .iter()
        .map(|doc| write_document(dirs, doc))
        .collect::<Result<Vec<_>>>()?;
    log::info!("Wrote {} parameter families", written.len());
    Ok(written)
}
