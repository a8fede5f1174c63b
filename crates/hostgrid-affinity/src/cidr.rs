//! IP network parsing and membership for the CIDR proximity filter.
//!
//! Supports IPv4 and IPv6. A network is a base address masked down to its
//! prefix; membership masks the candidate address the same way and compares.
//! An address from the other family is simply not a member (mixed v4/v6 is a
//! non-match, not an error).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{FilterError, FilterResult};

/// An IP network expressed as a masked base address plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    network: IpAddr,
    prefix_len: u8,
}

impl IpNetwork {
    /// Parse a network from a base IP string and a `/<n>` mask suffix.
    ///
    /// The base may be any address inside the network; it is masked down to
    /// the network address. Malformed input is a configuration error, never
    /// a silent accept.
    pub fn parse(base_ip: &str, suffix: &str) -> FilterResult<Self> {
        let base: IpAddr = base_ip
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| FilterError::InvalidAffinityIp {
                value: base_ip.to_string(),
                reason: e.to_string(),
            })?;

        let digits = suffix
            .trim()
            .strip_prefix('/')
            .ok_or_else(|| FilterError::InvalidCidr {
                value: suffix.to_string(),
                reason: "expected a leading '/'".to_string(),
            })?;
        let prefix_len: u8 = digits.parse().map_err(|_| FilterError::InvalidCidr {
            value: suffix.to_string(),
            reason: "prefix length is not a number".to_string(),
        })?;

        let max_prefix = match base {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max_prefix {
            return Err(FilterError::InvalidCidr {
                value: suffix.to_string(),
                reason: format!("prefix length exceeds {max_prefix}"),
            });
        }

        let network = match base {
            IpAddr::V4(v4) => {
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & v4_mask(prefix_len)))
            }
            IpAddr::V6(v6) => {
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & v6_mask(prefix_len)))
            }
        };

        Ok(Self { network, prefix_len })
    }

    /// Whether `ip` falls within this network.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                u32::from(addr) & v4_mask(self.prefix_len) == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                u128::from(addr) & v6_mask(self.prefix_len) == u128::from(net)
            }
            _ => false,
        }
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

fn v4_mask(prefix_len: u8) -> u32 {
    // Shifting by the full width is UB-adjacent; /0 masks everything away.
    match prefix_len {
        0 => 0,
        n => u32::MAX << (32 - u32::from(n)),
    }
}

fn v6_mask(prefix_len: u8) -> u128 {
    match prefix_len {
        0 => 0,
        n => u128::MAX << (128 - u32::from(n)),
    }
}
