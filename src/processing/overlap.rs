//! Overlapping CIDR detection.
//!
//! Used by the validator for the base address ranges and by the allocator
//! tests to check that no two allocated blocks collide.

use crate::models::Ipv4;
use itertools::Itertools;

/// Two ranges that share at least one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapConflict {
    pub first: Ipv4,
    pub second: Ipv4,
}

/// Every overlapping pair, in input order.
pub fn find_overlapping_ranges(ranges: &[Ipv4]) -> Vec<OverlapConflict> {
    ranges
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| a.overlaps(b))
        .map(|(a, b)| OverlapConflict {
            first: *a,
            second: *b,
        })
        .collect()
}

/// Log overlapping pairs as warnings.
pub fn log_overlapping_ranges(what: &str, conflicts: &[OverlapConflict]) {
    if conflicts.is_empty() {
        log::debug!("No overlapping {what} found.");
        return;
    }
    log::warn!("Found {} overlapping {what} pair(s):", conflicts.len());
    for conflict in conflicts {
        log::warn!("  {} overlaps {}", conflict.first, conflict.second);
    }
}
