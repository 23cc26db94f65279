//! Deterministic subnet allocation.
//!
//! Requests are packed largest block first into the base address ranges.
//! Each block starts on a boundary of its own size, and a block never spans
//! two base ranges. The cursor only moves forward, so re-running with the
//! same input always yields the same prefixes.

use crate::error::{Error, Result};
use crate::models::{AllocatedSubnet, Ipv4, SubnetDefinition, MAX_LENGTH};
use itertools::Itertools;

/// Round `cursor` up to the next multiple of `block`.
fn align_up(cursor: u64, block: u64) -> u64 {
    cursor.div_ceil(block) * block
}

/// Assign an address prefix to every request.
///
/// Results are returned in allocation order: ascending prefix length, ties
/// in input order.
pub fn allocate(ranges: &[Ipv4], requests: &[SubnetDefinition]) -> Result<Vec<AllocatedSubnet>> {
    let mut allocated = Vec::with_capacity(requests.len());
    let mut range_index = 0;
    let mut cursor = ranges.first().map_or(0, |r| r.lo_u32() as u64);

    for request in requests.iter().sorted_by_key(|r| r.prefix_length) {
        if request.prefix_length > MAX_LENGTH {
            return Err(unfit(request));
        }
        let block = 1u64 << (MAX_LENGTH - request.prefix_length);

        let prefix = loop {
            let Some(range) = ranges.get(range_index) else {
                return Err(unfit(request));
            };
            let start = align_up(cursor, block);
            let end = start + block - 1;
            if start >= range.lo_u32() as u64 && end <= range.hi_u32() as u64 {
                cursor = end + 1;
                break Ipv4::from_u32(start as u32, request.prefix_length);
            }
            log::debug!(
                "{} (/{}) does not fit in {range} from cursor, trying next range",
                request.alias,
                request.prefix_length
            );
            range_index += 1;
            if let Some(next) = ranges.get(range_index) {
                cursor = next.lo_u32() as u64;
            }
        };

        log::debug!("Allocated {prefix} to {} ({})", request.alias, request.name);
        allocated.push(AllocatedSubnet {
            name: request.name.clone(),
            alias: request.alias.clone(),
            address_prefix: prefix,
        });
    }

    log::info!(
        "Allocated {} subnet(s) in {} base range(s)",
        allocated.len(),
        ranges.len()
    );
    Ok(allocated)
}

fn unfit(request: &SubnetDefinition) -> Error {
    Error::Allocation {
        name: request.name.clone(),
        alias: request.alias.clone(),
        prefix_length: request.prefix_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::find_overlapping_ranges;

    fn request(alias: &str, prefix_length: u8) -> SubnetDefinition {
        SubnetDefinition {
            name: format!("snet-{alias}"),
            alias: alias.to_string(),
            prefix_length,
            legacy_token: None,
        }
    }

    fn ranges(values: &[&str]) -> Vec<Ipv4> {
        values.iter().map(|v| Ipv4::new(v).unwrap()).collect()
    }

    fn prefixes(subnets: &[AllocatedSubnet]) -> Vec<(String, String)> {
        subnets
            .iter()
            .map(|s| (s.alias.clone(), s.address_prefix.to_string()))
            .collect()
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 64), 256);
        assert_eq!(align_up(320, 256), 512);
    }

    #[test]
    fn test_first_aligned_block_after_previous() {
        let result = allocate(
            &ranges(&["10.0.0.0/16"]),
            &[request("a", 24), request("b", 26)],
        )
        .unwrap();
        assert_eq!(
            prefixes(&result),
            vec![
                ("a".to_string(), "10.0.0.0/24".to_string()),
                ("b".to_string(), "10.0.1.0/26".to_string()),
            ]
        );
    }

    #[test]
    fn test_largest_blocks_first_with_stable_ties() {
        let result = allocate(
            &ranges(&["10.0.0.0/16"]),
            &[
                request("small", 28),
                request("big", 22),
                request("mid1", 24),
                request("mid2", 24),
            ],
        )
        .unwrap();
        assert_eq!(
            prefixes(&result),
            vec![
                ("big".to_string(), "10.0.0.0/22".to_string()),
                ("mid1".to_string(), "10.0.4.0/24".to_string()),
                ("mid2".to_string(), "10.0.5.0/24".to_string()),
                ("small".to_string(), "10.0.6.0/28".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_to_next_range() {
        let result = allocate(
            &ranges(&["10.0.0.0/24", "10.1.0.0/16"]),
            &[request("a", 25), request("b", 25), request("c", 24), request("d", 26)],
        )
        .unwrap();
        assert_eq!(
            prefixes(&result),
            vec![
                ("c".to_string(), "10.0.0.0/24".to_string()),
                ("a".to_string(), "10.1.0.0/25".to_string()),
                ("b".to_string(), "10.1.0.128/25".to_string()),
                ("d".to_string(), "10.1.1.0/26".to_string()),
            ]
        );
    }

    #[test]
    fn test_does_not_fit() {
        let err = allocate(
            &ranges(&["10.0.0.0/24", "10.0.1.0/24"]),
            &[request("ok", 25), request("huge", 23)],
        )
        .unwrap_err();
        match err {
            Error::Allocation {
                alias,
                prefix_length,
                ..
            } => {
                assert_eq!(alias, "huge");
                assert_eq!(prefix_length, 23);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_skipped_range_is_not_revisited() {
        // the /24 skips the smaller first range, which stays unused afterwards
        let err = allocate(
            &ranges(&["10.0.0.0/25", "10.0.1.0/24"]),
            &[request("small", 26), request("big", 24)],
        )
        .unwrap_err();
        assert!(
            matches!(err, Error::Allocation { ref alias, .. } if alias == "small"),
            "{err}"
        );
    }

    #[test]
    fn test_no_ranges() {
        assert!(allocate(&[], &[request("a", 24)]).is_err());
        assert!(allocate(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_idempotent_and_disjoint() {
        let base = ranges(&["10.10.0.0/20", "172.16.0.0/22", "192.168.8.0/21"]);
        let requests: Vec<SubnetDefinition> = [22, 24, 26, 27, 23, 28, 29, 24, 22, 25, 21]
            .iter()
            .enumerate()
            .map(|(i, len)| request(&format!("s{i}"), *len))
            .collect();

        let first = allocate(&base, &requests).unwrap();
        let second = allocate(&base, &requests).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), requests.len());

        let blocks: Vec<Ipv4> = first.iter().map(|s| s.address_prefix).collect();
        assert!(find_overlapping_ranges(&blocks).is_empty());
        for block in &blocks {
            assert!(
                base.iter().any(|r| r.contains(block)),
                "{block} is outside every base range"
            );
            assert_eq!(block.lo_u32() as u64 % block.block_size(), 0);
        }
    }
}
