//! `no_proxy` list parsing and host matching
//!
//! Handles the comma- or space-separated exclusion list with suffix, wildcard
//! and IP/CIDR entries.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// `*`
    Any,
    /// Host suffix, lower-cased, leading dot removed
    Suffix(String),
    Ip(IpAddr),
    Cidr(IpAddr, u8),
}

/// Parsed proxy exclusion list.
///
/// The rules are as follows:
/// * Entries are separated by commas and/or whitespace
/// * An entry `*` matches every host
/// * IP addresses (both IPv4 and IPv6) match IP hosts, optionally with a
///   subnet mask (`192.168.1.0/24`)
/// * Any other entry is a host suffix; a leading dot is ignored and the
///   comparison is case-insensitive. `example.com` therefore matches
///   `www.example.com` and also `notexample.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoProxy {
    patterns: Vec<Pattern>,
    malformed: Vec<String>,
}

impl NoProxy {
    pub fn parse(list: &str) -> Self {
        let mut no_proxy = NoProxy::default();

        for raw in list.split(|c: char| c == ',' || c.is_whitespace()) {
            if raw.is_empty() {
                continue;
            }
            let entry = raw.to_ascii_lowercase();

            if entry == "*" {
                no_proxy.patterns.push(Pattern::Any);
            } else if entry.contains('/') {
                match parse_cidr_pattern(&entry) {
                    Some((network, prefix_len)) => {
                        no_proxy.patterns.push(Pattern::Cidr(network, prefix_len));
                    }
                    None => no_proxy.malformed.push(raw.to_string()),
                }
            } else if entry.contains(['@', '?', '#', '\\']) {
                no_proxy.malformed.push(raw.to_string());
            } else if let Ok(ip) = strip_brackets(&entry).parse::<IpAddr>() {
                no_proxy.patterns.push(Pattern::Ip(ip));
            } else {
                let suffix = entry.strip_prefix('.').unwrap_or(&entry);
                if suffix.is_empty() {
                    no_proxy.malformed.push(raw.to_string());
                } else {
                    no_proxy.patterns.push(Pattern::Suffix(suffix.to_string()));
                }
            }
        }

        no_proxy
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.malformed.is_empty()
    }

    /// Entries that could not be understood.
    pub fn malformed(&self) -> &[String] {
        &self.malformed
    }

    /// Check if a host should bypass the proxy.
    pub fn matches(&self, host: &str) -> bool {
        let host = strip_brackets(host).to_ascii_lowercase();
        let host_ip = host.parse::<IpAddr>().ok();

        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Any => true,
            Pattern::Suffix(suffix) => host.ends_with(suffix.as_str()),
            Pattern::Ip(ip) => host_ip == Some(*ip),
            Pattern::Cidr(network, prefix_len) => {
                host_ip.is_some_and(|ip| ip_in_subnet(ip, *network, *prefix_len))
            }
        })
    }
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Parse a CIDR pattern (e.g., "192.168.1.0/24" or "2001:db8::/32")
/// Returns Some((network_address, prefix_length)) if valid CIDR notation, None otherwise
fn parse_cidr_pattern(pattern: &str) -> Option<(IpAddr, u8)> {
    let (network_str, prefix_str) = pattern.split_once('/')?;

    let network_addr = strip_brackets(network_str).parse::<IpAddr>().ok()?;
    let prefix_len = prefix_str.parse::<u8>().ok()?;

    let max_prefix = match network_addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    (prefix_len <= max_prefix).then_some((network_addr, prefix_len))
}

fn ip_in_subnet(ip: IpAddr, network: IpAddr, prefix_len: u8) -> bool {
    match (ip, network) {
        (IpAddr::V4(ip_v4), IpAddr::V4(net_v4)) => ipv4_in_subnet(ip_v4, net_v4, prefix_len),
        (IpAddr::V6(ip_v6), IpAddr::V6(net_v6)) => ipv6_in_subnet(ip_v6, net_v6, prefix_len),
        _ => false,
    }
}

fn ipv4_in_subnet(ip: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = !((1u64 << (32 - u32::from(prefix_len))) - 1) as u32;
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_subnet(ip: Ipv6Addr, network: Ipv6Addr, prefix_len: u8) -> bool {
    let ip_bytes = ip.octets();
    let network_bytes = network.octets();

    let full_bytes = (prefix_len / 8) as usize;
    let remaining_bits = prefix_len % 8;

    if ip_bytes[..full_bytes] != network_bytes[..full_bytes] {
        return false;
    }

    if remaining_bits > 0 && full_bytes < 16 {
        let mask = 0xFFu8 << (8 - remaining_bits);
        if ip_bytes[full_bytes] & mask != network_bytes[full_bytes] & mask {
            return false;
        }
    }

    true
}
