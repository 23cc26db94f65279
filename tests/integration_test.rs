//! Integration tests for azure-network-params
//!
//! These tests run the complete pipeline from the JSON fixtures in
//! `tests/data` to the generated parameter and metadata files.

use azure_network_params::config::{InputPaths, Inputs, OutputDirs};
use azure_network_params::models::{AddressPrefixes, Peer};
use azure_network_params::{compile, run, Compilation, Error};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn data(file: &str) -> PathBuf {
    PathBuf::from("tests/data").join(file)
}

fn inputs() -> Inputs {
    InputPaths {
        common: data("common.json"),
        subnets: data("subnets.json"),
        nsgs: data("nsgs.json"),
        route_tables: data("route-tables.json"),
        firewall: Some(data("firewall.json")),
    }
    .load()
    .expect("Failed to load fixtures")
}

fn output_dirs(tmp: &TempDir) -> OutputDirs {
    OutputDirs {
        params_dir: tmp.path().join("params"),
        meta_dir: tmp.path().join("meta"),
    }
}

fn prefix_of(c: &Compilation, alias: &str) -> String {
    c.allocated
        .iter()
        .find(|s| s.alias == alias)
        .map(|s| s.address_prefix.to_string())
        .unwrap_or_else(|| panic!("{alias} not allocated"))
}

#[test]
fn test_allocation_order_and_prefixes() {
    let c = compile(&inputs()).expect("Failed to compile");

    let order: Vec<&str> = c.allocated.iter().map(|s| s.alias.as_str()).collect();
    assert_eq!(
        order,
        vec!["usernode", "agentnode", "agic", "firewall", "bastion", "maint", "pe-nsg"]
    );
    assert_eq!(prefix_of(&c, "usernode"), "10.0.0.0/22");
    assert_eq!(prefix_of(&c, "agentnode"), "10.0.4.0/24");
    assert_eq!(prefix_of(&c, "agic"), "10.0.5.0/24");
    assert_eq!(prefix_of(&c, "firewall"), "10.0.6.0/26");
    assert_eq!(prefix_of(&c, "bastion"), "10.0.6.64/26");
    assert_eq!(prefix_of(&c, "maint"), "10.0.6.128/27");
    assert_eq!(prefix_of(&c, "pe-nsg"), "10.0.6.160/27");
    assert_eq!(c.routes.firewall_private_ip.to_string(), "10.0.6.1");

    let free: Vec<String> = c.free_blocks.iter().map(|f| f.block.to_string()).collect();
    assert_eq!(free[0], "10.0.6.192/26");
    assert_eq!(free.last().map(String::as_str), Some("10.0.128.0/17"));
}

#[test]
fn test_compile_is_idempotent() {
    let first = compile(&inputs()).expect("Failed to compile");
    let second = compile(&inputs()).expect("Failed to compile");
    assert_eq!(first.allocated, second.allocated);
    assert_eq!(first.nsgs, second.nsgs);
    assert_eq!(first.routes, second.routes);
}

#[test]
fn test_security_groups() {
    let c = compile(&inputs()).expect("Failed to compile");

    let aliases: Vec<&str> = c.nsgs.iter().map(|n| n.subnet_alias.as_str()).collect();
    assert_eq!(aliases, vec!["usernode", "agentnode", "maint", "pe-nsg"]);

    let names = |alias: &str| -> Vec<String> {
        c.nsgs
            .iter()
            .find(|n| n.subnet_alias == alias)
            .map(|n| n.rules.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    };
    assert_eq!(names("usernode"), vec!["AllowFromAny", "AllowToFirewall"]);
    assert!(names("agentnode").is_empty());
    assert_eq!(names("maint"), vec!["AllowFromMaintBastion"]);
    assert_eq!(names("pe-nsg"), vec!["AllowFromUsernodePe", "DenyInternetInbound"]);
}

#[test]
fn test_written_files() {
    let tmp = TempDir::new().unwrap();
    let dirs = output_dirs(&tmp);
    run(&inputs(), &dirs).expect("Failed to run");

    for family in [
        "virtual-network",
        "subnets",
        "nsgs",
        "route-tables",
        "subnet-attachments",
        "firewall",
    ] {
        let params = fs::read_to_string(dirs.params_dir.join(format!("{family}.bicepparam")))
            .unwrap_or_else(|e| panic!("{family}: {e}"));
        assert!(params.starts_with(&format!("using '../bicep/main.{family}.bicep'\n")));
        assert!(params.ends_with('\n') && !params.ends_with("\n\n"));

        let meta = fs::read_to_string(dirs.meta_dir.join(format!("{family}-meta.json"))).unwrap();
        let meta: Value = serde_json::from_str(&meta).unwrap();
        assert!(meta["paramsFile"].as_str().unwrap().ends_with(".bicepparam"));
    }

    let vnet = fs::read_to_string(dirs.params_dir.join("virtual-network.bicepparam")).unwrap();
    assert!(vnet.contains("param vnetName = 'vnet-dev-shop'\n"));
    assert!(vnet.contains("param vnetAddressPrefixes = [\n  '10.0.0.0/16'\n]\n"));
    assert!(vnet.contains("param vnetDnsServers = []\n"));
    assert!(vnet.contains("param lockKind = 'CanNotDelete'\n"));
    assert!(vnet.contains("param ddosProtectionPlanName = 'ddos-dev-shop'\n"));

    let subnets = fs::read_to_string(dirs.params_dir.join("subnets.bicepparam")).unwrap();
    assert!(subnets.contains("    name: 'snet-pe'\n    alias: 'pe-nsg'\n    prefixLength: 27\n    privateEndpointNetworkPolicies: 'Disabled'\n    addressPrefix: '10.0.6.160/27'\n"));

    let nsgs = fs::read_to_string(dirs.params_dir.join("nsgs.bicepparam")).unwrap();
    assert!(nsgs.contains("subnetName: 'maint'"));
    assert!(nsgs.contains("sourceAddressPrefix: '10.0.6.64/26'"));
    assert!(nsgs.contains("destinationPortRanges: [\n"));
    assert!(!nsgs.contains("subnetName: 'agic'"));

    let attachments =
        fs::read_to_string(dirs.params_dir.join("subnet-attachments.bicepparam")).unwrap();
    assert!(attachments.contains("networkSecurityGroupName: 'nsg-dev-shop-usernode'"));
    assert!(attachments.contains("routeTableName: 'rt-dev-shop-firewall'"));
    assert!(!attachments.contains("AzureFirewallSubnet"));

    let meta: Value = serde_json::from_str(
        &fs::read_to_string(dirs.meta_dir.join("firewall-meta.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(meta["resourceGroupName"], "rg-dev-shop-nw");
    assert_eq!(meta["deploy"], false);
    assert_eq!(meta["firewallPrivateIp"], "10.0.6.1");

    let firewall = fs::read_to_string(dirs.params_dir.join("firewall.bicepparam")).unwrap();
    assert!(firewall.contains("param threatIntelMode = 'Alert'\n"));
    assert!(firewall.contains("param protectionMode = 'Enabled'\n"));
}

#[test]
fn test_route_tables() {
    let c = compile(&inputs()).expect("Failed to compile");
    let ingress = &c.routes.tables[0];
    assert_eq!(ingress.name, "firewall");
    assert_eq!(ingress.subnet_names, vec!["agic"]);
    let routes: Vec<(&str, &str)> = ingress
        .routes
        .iter()
        .map(|r| (r.name.as_str(), r.address_prefix.as_str()))
        .collect();
    assert_eq!(
        routes,
        vec![
            ("udr-usernode-inbound", "10.0.0.0/22"),
            ("udr-agentnode-inbound", "10.0.4.0/24")
        ]
    );

    // unknown alias "typo" is dropped
    let egress = &c.routes.tables[1];
    assert_eq!(egress.subnet_names, vec!["usernode", "agentnode", "maint"]);
    assert_eq!(egress.routes[0].next_hop_ip_address.to_string(), "10.0.6.1");
}

#[test]
fn test_shared_bastion() {
    let mut inputs = inputs();
    inputs.common["network"]["sharedBastionIp"] = json!("192.168.100.4");
    let c = compile(&inputs).expect("Failed to compile");

    assert!(c.allocated.iter().all(|s| s.alias != "bastion"));
    assert_eq!(prefix_of(&c, "maint"), "10.0.6.64/27");
    let maint = c.nsgs.iter().find(|n| n.subnet_alias == "maint").unwrap();
    assert_eq!(
        maint.rules[0].source,
        AddressPrefixes::One("192.168.100.4".into())
    );
}

#[test]
fn test_egress_next_hop_override() {
    let mut inputs = inputs();
    inputs.common["network"]["egressNextHopIp"] = json!("10.50.0.4");
    let c = compile(&inputs).expect("Failed to compile");
    assert_eq!(
        c.routes.tables[1].routes[0].next_hop_ip_address.to_string(),
        "10.50.0.4"
    );
    assert_eq!(
        c.routes.tables[0].routes[0].next_hop_ip_address.to_string(),
        "10.0.6.1"
    );
}

#[test]
fn test_validation_errors_are_aggregated() {
    let mut inputs = inputs();
    inputs.common["aks"]["serviceCidr"] = json!("10.96.0.0/29");
    inputs.common["common"]["location"] = json!("");
    let err = compile(&inputs).unwrap_err();
    assert_eq!(err.exit_code(), 1);
    match err {
        Error::Validation(errors) => {
            assert!(errors.iter().any(|e| e.starts_with("aks.serviceCidr:")));
            assert!(errors.iter().any(|e| e.starts_with("common.location:")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_shared_legacy_token_is_rejected() {
    let mut inputs = inputs();
    inputs.subnets["subnetDefinitions"][0]["nsg-rule"] = json!("pe-nsg");
    match compile(&inputs).unwrap_err() {
        Error::Validation(errors) => {
            assert_eq!(errors.len(), 1, "{errors:?}");
            assert!(errors[0].starts_with(
                "subnetDefinitions[4].nsg-rule: duplicate legacy token 'pe-nsg'"
            ));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_subnet_that_does_not_fit() {
    let mut inputs = inputs();
    inputs.common["network"]["vnetAddressPrefixes"] = json!(["10.0.0.0/22"]);
    let err = compile(&inputs).unwrap_err();
    match err {
        Error::Allocation {
            name,
            alias,
            prefix_length,
        } => {
            assert_eq!(name, "snet-agentnode");
            assert_eq!(alias, "agentnode");
            assert_eq!(prefix_length, 24);
        }
        other => panic!("expected allocation error, got {other}"),
    }
}

#[test]
fn test_unresolved_rule_peer() {
    let mut inputs = inputs();
    inputs.nsgs.templates[0].rules[0].source = Some(Peer::One("nowhere".into()));
    let err = compile(&inputs).unwrap_err();
    assert!(matches!(err, Error::Resolution(_)));
    assert!(err.to_string().contains("'nowhere'"));
}

#[test]
fn test_missing_env_is_usage_error() {
    std::env::remove_var("COMMON_FILE");
    let err = InputPaths::from_env().unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
