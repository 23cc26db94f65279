//! Terminal summary of the allocation.
//!
//! Rows are CSV with quoted, right-aligned fields so they line up in a
//! terminal and still paste into a spreadsheet.

use crate::models::{num_az_hosts, Ipv4};
use crate::processing::{FreeBlock, SubnetAttachment};
use crate::Compilation;
use colored::Colorize;

/// Quote `value` and right-align it to `width`.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Azure-usable host count, or `-` for blocks too small to host anything.
fn az_hosts(prefix: &Ipv4) -> String {
    num_az_hosts(prefix.mask)
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "-".to_string())
}

const HEADER: &str = "j,kind,cidr,az_hosts,broadcast,name,alias,nsg,route_table";

fn allocated_row(j: usize, prefix: &Ipv4, name: &str, alias: &str, nsg: &str, rt: &str) -> String {
    format!(
        "{j},{kind},{cidr},{hosts},{broadcast},{name},{alias},{nsg},{rt}",
        j = format_field(j, 4),
        kind = format_field("subnet", 8),
        cidr = format_field(prefix, 18),
        hosts = format_field(az_hosts(prefix), 8),
        broadcast = format_field(format!("{}_br", prefix.hi()), 19),
        name = format_field(name, 28),
        alias = format_field(alias, 14),
        nsg = format_field(nsg, 28),
        rt = format_field(rt, 24),
    )
}

fn free_row(j: usize, free: &FreeBlock) -> String {
    format!(
        "{j},{kind},{cidr},{hosts},{broadcast},{name},{alias},{nsg},{rt}",
        j = format_field(j, 4),
        kind = format_field("gap", 8),
        cidr = format_field(free.block, 18),
        hosts = format_field(az_hosts(&free.block), 8),
        broadcast = format_field(format!("{}_br", free.block.hi()), 19),
        name = format_field(format!("{}_vnet", free.range), 28),
        alias = format_field("", 14),
        nsg = format_field("", 28),
        rt = format_field("", 24),
    )
}

/// Summary rows: allocated subnets in address order, then free blocks.
pub fn summary_rows(c: &Compilation) -> Vec<String> {
    let mut rows = vec![HEADER.to_string()];
    let mut allocated: Vec<_> = c.allocated.iter().collect();
    allocated.sort_by_key(|s| s.address_prefix);

    for (i, subnet) in allocated.iter().enumerate() {
        let attachment: Option<&SubnetAttachment> =
            c.attachments.iter().find(|a| a.alias == subnet.alias);
        let (nsg, rt) = attachment
            .map(|a| {
                (
                    a.network_security_group_name.as_str(),
                    a.route_table_name.as_str(),
                )
            })
            .unwrap_or(("", ""));
        rows.push(allocated_row(
            i + 1,
            &subnet.address_prefix,
            &subnet.name,
            &subnet.alias,
            nsg,
            rt,
        ));
    }
    let offset = rows.len();
    for (i, free) in c.free_blocks.iter().enumerate() {
        rows.push(free_row(offset + i, free));
    }
    rows
}

/// Print the summary to stdout.
pub fn print_summary(c: &Compilation) {
    for row in summary_rows(c) {
        println!("{row}");
    }
    println!(
        "#{}# {} subnet(s) allocated, {} free block(s), firewall {}",
        "DONE".on_green(),
        c.allocated.len(),
        c.free_blocks.len(),
        c.routes.firewall_private_ip.to_string().green()
    );
}
