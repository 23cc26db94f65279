//! IPv4 address and CIDR notation utilities.
//!
//! Provides the [`Ipv4`] CIDR block used for base address ranges and
//! allocated subnets, along with the prefix arithmetic the allocator and the
//! validator share.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Number of addresses Azure reserves in every subnet.
pub const AZURE_RESERVED_HOSTS: u64 = 5;

/// CIDR parsing and arithmetic failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("invalid CIDR format '{0}', expected x.x.x.x/nn")]
    Format(String),
    #[error("invalid IPv4 address '{0}'")]
    Address(String),
    #[error("invalid prefix length '{0}'")]
    PrefixLength(String),
    #[error("'{0}' has host bits set")]
    HostBitsSet(String),
}

impl From<CidrError> for crate::Error {
    fn from(e: CidrError) -> Self {
        crate::Error::Config(e.to_string())
    }
}

/// Subnet mask for a prefix length; lengths above 32 saturate.
fn mask_bits(len: u8) -> u32 {
    let right_len = MAX_LENGTH - len.min(MAX_LENGTH);
    ((u32::MAX as u64 >> right_len) << right_len) as u32
}

/// Number of usable host addresses in an Azure subnet of the given length.
///
/// Azure reserves 5 addresses per subnet (network, broadcast, gateway, and 2 DNS).
pub fn num_az_hosts(len: u8) -> Result<u64, CidrError> {
    if len >= MAX_LENGTH - 2 {
        return Err(CidrError::PrefixLength(len.to_string()));
    }
    Ok((1u64 << (MAX_LENGTH - len)) - AZURE_RESERVED_HOSTS)
}

/// Smallest prefix length for which `ip` is a valid network address.
pub fn lo_mask(ip: Ipv4Addr) -> u8 {
    MAX_LENGTH - u32::from(ip).trailing_zeros().min(32) as u8
}

/// Parse a bare IPv4 address.
pub fn parse_ip(value: &str) -> Result<Ipv4Addr, CidrError> {
    Ipv4Addr::from_str(value.trim()).map_err(|_| CidrError::Address(value.to_string()))
}

/// True when `value` is a bare IPv4 address or a strict CIDR block.
pub fn is_ip_or_cidr(value: &str) -> bool {
    if value.contains('/') {
        Ipv4::parse_strict(value).is_ok()
    } else {
        parse_ip(value).is_ok()
    }
}

/// IPv4 CIDR block.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The subnet mask length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4::parse_strict(&s).map_err(de::Error::custom)
    }
}

impl Ipv4 {
    /// Parse a CIDR string (e.g. "10.0.0.0/24"). Host bits are allowed.
    pub fn new(addr_cidr: &str) -> Result<Ipv4, CidrError> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| CidrError::Format(addr_cidr.to_string()))?;
        let addr = parse_ip(addr)?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| CidrError::PrefixLength(mask.to_string()))?;
        if mask > MAX_LENGTH {
            return Err(CidrError::PrefixLength(mask.to_string()));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// Parse a CIDR string and reject it when host bits are set.
    pub fn parse_strict(addr_cidr: &str) -> Result<Ipv4, CidrError> {
        let cidr = Ipv4::new(addr_cidr)?;
        if cidr.addr != cidr.lo() {
            return Err(CidrError::HostBitsSet(addr_cidr.trim().to_string()));
        }
        Ok(cidr)
    }

    /// Build a block from a raw network address, masking off host bits.
    pub fn from_u32(network: u32, mask: u8) -> Ipv4 {
        let mask = mask.min(MAX_LENGTH);
        Ipv4 {
            addr: Ipv4Addr::from(network & mask_bits(mask)),
            mask,
        }
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.lo_u32())
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.hi_u32())
    }

    pub fn lo_u32(&self) -> u32 {
        u32::from(self.addr) & mask_bits(self.mask)
    }

    pub fn hi_u32(&self) -> u32 {
        self.lo_u32() | !mask_bits(self.mask)
    }

    /// Number of addresses covered by the block.
    pub fn block_size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask.min(MAX_LENGTH))
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &Ipv4) -> bool {
        self.mask <= other.mask && self.lo_u32() <= other.lo_u32() && other.hi_u32() <= self.hi_u32()
    }

    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        let bits = u32::from(addr);
        self.lo_u32() <= bits && bits <= self.hi_u32()
    }

    pub fn overlaps(&self, other: &Ipv4) -> bool {
        self.lo_u32() <= other.hi_u32() && other.lo_u32() <= self.hi_u32()
    }

    /// Count of usable hosts, excluding network and broadcast addresses.
    ///
    /// /31 and /32 blocks have no reserved addresses.
    pub fn usable_hosts(&self) -> u64 {
        match self.mask {
            32 => 1,
            31 => 2,
            _ => self.block_size() - 2,
        }
    }

    /// The `n`th usable host (zero based), if the block has that many.
    pub fn nth_host(&self, n: u64) -> Option<Ipv4Addr> {
        if n >= self.usable_hosts() {
            return None;
        }
        let first = match self.mask {
            31 | 32 => self.lo_u32() as u64,
            _ => self.lo_u32() as u64 + 1,
        };
        Some(Ipv4Addr::from((first + n) as u32))
    }
}

impl FromStr for Ipv4 {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4::parse_strict(s)
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lo_and_hi() {
        let net = Ipv4::new("192.168.1.42/16").unwrap();
        assert_eq!(net.lo(), Ipv4Addr::new(192, 168, 0, 0));
        assert_eq!(net.hi(), Ipv4Addr::new(192, 168, 255, 255));
        let all = Ipv4::new("0.0.0.0/0").unwrap();
        assert_eq!(all.hi(), Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(Ipv4::from_u32(u32::MAX, 24).to_string(), "255.255.255.0/24");
    }

    #[test]
    fn test_num_az_hosts() {
        assert_eq!(num_az_hosts(24).unwrap(), 251);
        assert_eq!(num_az_hosts(26).unwrap(), 59);
        assert_eq!(num_az_hosts(29).unwrap(), 3);
        assert!(num_az_hosts(30).is_err());
    }

    #[test]
    fn test_parse_strict() {
        assert!(Ipv4::parse_strict("10.0.0.0/16").is_ok());
        assert_eq!(
            Ipv4::parse_strict("10.0.0.1/16"),
            Err(CidrError::HostBitsSet("10.0.0.1/16".to_string()))
        );
        assert!(matches!(Ipv4::new("10.0.0.0"), Err(CidrError::Format(_))));
        assert!(matches!(
            Ipv4::new("10.0.0.0/33"),
            Err(CidrError::PrefixLength(_))
        ));
        assert!(matches!(
            Ipv4::new("10.0.300.0/24"),
            Err(CidrError::Address(_))
        ));
    }

    #[test]
    fn test_contains_and_overlaps() {
        let vnet = Ipv4::new("10.0.0.0/16").unwrap();
        let inner = Ipv4::new("10.0.4.0/22").unwrap();
        let outside = Ipv4::new("10.1.0.0/24").unwrap();
        assert!(vnet.contains(&inner));
        assert!(!inner.contains(&vnet));
        assert!(!vnet.contains(&outside));
        assert!(vnet.overlaps(&inner));
        assert!(inner.overlaps(&vnet));
        assert!(!vnet.overlaps(&outside));
        assert!(vnet.contains_addr(Ipv4Addr::new(10, 0, 255, 255)));
    }

    #[test]
    fn test_usable_hosts() {
        assert_eq!(Ipv4::new("10.0.0.0/29").unwrap().usable_hosts(), 6);
        assert_eq!(Ipv4::new("10.0.0.0/28").unwrap().usable_hosts(), 14);
        assert_eq!(Ipv4::new("10.0.0.0/31").unwrap().usable_hosts(), 2);
        assert_eq!(Ipv4::new("10.0.0.0/32").unwrap().usable_hosts(), 1);
    }

    #[test]
    fn test_nth_host() {
        let net = Ipv4::new("10.0.1.0/26").unwrap();
        assert_eq!(net.nth_host(0), Some(Ipv4Addr::new(10, 0, 1, 1)));
        assert_eq!(net.nth_host(9), Some(Ipv4Addr::new(10, 0, 1, 10)));
        assert_eq!(net.nth_host(61), Some(Ipv4Addr::new(10, 0, 1, 62)));
        assert_eq!(net.nth_host(62), None);
    }

    #[test]
    fn test_lo_mask() {
        assert_eq!(lo_mask(Ipv4Addr::new(192, 168, 1, 1)), 32);
        assert_eq!(lo_mask(Ipv4Addr::new(10, 6, 2, 80)), 28);
        assert_eq!(lo_mask(Ipv4Addr::new(0, 0, 0, 0)), 0);
    }

    #[test]
    fn test_serde_roundtrip_rejects_host_bits() {
        let ok: Ipv4 = serde_json::from_str("\"10.1.0.0/24\"").unwrap();
        assert_eq!(ok.to_string(), "10.1.0.0/24");
        assert!(serde_json::from_str::<Ipv4>("\"10.1.0.7/24\"").is_err());
    }

    #[test]
    fn test_is_ip_or_cidr() {
        assert!(is_ip_or_cidr("10.0.0.4"));
        assert!(is_ip_or_cidr("10.0.0.0/24"));
        assert!(!is_ip_or_cidr("10.0.0.4/24"));
        assert!(!is_ip_or_cidr("web"));
    }
}
