//! Free space left in the base ranges after allocation.
//!
//! Gaps are reported as the largest aligned CIDR blocks that fit, the same
//! way a subnet could later be carved out of them.

use crate::models::{lo_mask, AllocatedSubnet, Ipv4, MAX_LENGTH};
use std::net::Ipv4Addr;

/// An unused aligned block inside a base range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    pub range: Ipv4,
    pub block: Ipv4,
}

/// Find the biggest block starting at `start` that ends before `end`
/// (exclusive).
///
/// The returned mask is constrained by:
/// 1. The `start_mask` parameter (won't return a smaller mask)
/// 2. The IP alignment - `start` must be a valid network address for the mask
/// 3. The block must not reach `end`
fn find_biggest_subnet(start: u64, start_mask: u8, end: u64) -> u8 {
    let min_mask_for_alignment = lo_mask(Ipv4Addr::from(start as u32));
    let mut next_mask = start_mask.max(min_mask_for_alignment);
    while next_mask < MAX_LENGTH && start + (1u64 << (MAX_LENGTH - next_mask)) > end {
        next_mask += 1;
    }
    next_mask
}

/// Cover `[start, end)` with the largest aligned blocks.
fn fill(range: Ipv4, mut start: u64, end: u64, out: &mut Vec<FreeBlock>) {
    while start < end {
        let mask = find_biggest_subnet(start, range.mask, end);
        let block = Ipv4::from_u32(start as u32, mask);
        out.push(FreeBlock { range, block });
        start += block.block_size();
    }
}

/// Free blocks per base range, in address order.
pub fn find_free_blocks(ranges: &[Ipv4], allocated: &[AllocatedSubnet]) -> Vec<FreeBlock> {
    let mut free = Vec::new();
    for range in ranges {
        let mut used: Vec<Ipv4> = allocated
            .iter()
            .map(|s| s.address_prefix)
            .filter(|p| range.contains(p))
            .collect();
        used.sort();

        let mut next = range.lo_u32() as u64;
        for block in used {
            fill(*range, next, block.lo_u32() as u64, &mut free);
            next = next.max(block.hi_u32() as u64 + 1);
        }
        fill(*range, next, range.hi_u32() as u64 + 1, &mut free);
    }
    log::debug!("Found {} free block(s)", free.len());
    free
}
