//! Compiles declarative network settings into Azure Bicep parameter files.
//!
//! The pipeline runs once per invocation:
//! validate -> allocate subnets -> expand security rules -> build route
//! tables -> bind subnets -> emit one parameter file per resource family.
//! Each stage takes the previous stage's output by reference; nothing is
//! re-derived downstream.

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod validation;

pub use error::{Error, Result};

use config::{
    FirewallConfig, Inputs, NsgConfig, OutputDirs, RouteTablesConfig, Settings, SubnetsConfig,
    BASTION_ALIAS,
};
use models::{AllocatedSubnet, NetworkSecurityGroup, SubnetDefinition};
use processing::{
    AliasResolver, FreeBlock, RoutePlan, RouteTableBuilder, RuleTemplateExpander, Selector,
    SubnetAttachment, MAINT_BASTION_SELECTOR,
};

/// Everything computed for one run.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub settings: Settings,
    pub subnets: SubnetsConfig,
    pub nsg_config: NsgConfig,
    pub route_config: RouteTablesConfig,
    pub firewall_config: FirewallConfig,
    /// Canonical definitions that were allocated.
    pub definitions: Vec<SubnetDefinition>,
    /// Allocation order.
    pub allocated: Vec<AllocatedSubnet>,
    pub nsgs: Vec<NetworkSecurityGroup>,
    pub routes: RoutePlan,
    pub attachments: Vec<SubnetAttachment>,
    pub free_blocks: Vec<FreeBlock>,
}

/// Resolver over the allocation, with service tags and selectors registered.
pub fn build_resolver(
    settings: &Settings,
    nsg_config: &NsgConfig,
    definitions: &[SubnetDefinition],
    allocated: &[AllocatedSubnet],
) -> AliasResolver {
    let mut resolver = AliasResolver::new(definitions, allocated)
        .with_service_tags(nsg_config.service_tags.iter().cloned())
        .with_selector(
            MAINT_BASTION_SELECTOR,
            Selector {
                override_ip: settings.shared_bastion_ip().map(str::to_string),
                fallback_alias: BASTION_ALIAS.to_string(),
            },
        );
    for (name, selector) in &nsg_config.selectors {
        resolver = resolver.with_selector(
            name.clone(),
            Selector {
                override_ip: selector.override_ip.clone(),
                fallback_alias: selector.fallback_subnet.clone(),
            },
        );
    }
    resolver
}

/// Run the whole pipeline over loaded inputs.
pub fn compile(inputs: &Inputs) -> Result<Compilation> {
    log::info!("#Start compile()");
    validation::ensure_valid(&inputs.common, &inputs.subnets)?;

    let settings: Settings = config::parse(&inputs.common, "common parameters")?;
    let subnets: SubnetsConfig = config::parse(&inputs.subnets, "subnets config")?;
    let definitions = subnets.definitions(&settings);
    let ranges = &settings.network.vnet_address_prefixes;

    let allocated = processing::allocate(ranges, &definitions)?;
    let prefixes: Vec<_> = allocated.iter().map(|s| s.address_prefix).collect();
    processing::log_overlapping_ranges(
        "allocated subnets",
        &processing::find_overlapping_ranges(&prefixes),
    );

    let resolver = build_resolver(&settings, &inputs.nsgs, &definitions, &allocated);
    let nsgs = RuleTemplateExpander::new(&resolver, &inputs.nsgs).expand(&allocated)?;
    let routes =
        RouteTableBuilder::new(&resolver, &inputs.route_tables, settings.egress_next_hop_ip())
            .build()?;
    let attachments = processing::subnet_attachments(
        &settings,
        &allocated,
        &nsgs,
        &routes,
        &inputs.route_tables.firewall_subnet_alias,
    );
    let free_blocks = processing::find_free_blocks(ranges, &allocated);

    Ok(Compilation {
        settings,
        subnets,
        nsg_config: inputs.nsgs.clone(),
        route_config: inputs.route_tables.clone(),
        firewall_config: inputs.firewall.clone(),
        definitions,
        allocated,
        nsgs,
        routes,
        attachments,
        free_blocks,
    })
}

/// Compile and write every parameter family.
pub fn run(inputs: &Inputs, dirs: &OutputDirs) -> Result<Compilation> {
    let compilation = compile(inputs)?;
    output::write_all(dirs, &compilation)?;
    Ok(compilation)
}
