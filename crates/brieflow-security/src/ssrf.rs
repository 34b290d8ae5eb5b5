// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSRF-safe DNS resolver that blocks connections to private IP ranges.
//!
//! Callback URLs arrive with job input, so every outbound webhook goes
//! through a client whose resolver drops private addresses before connect.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::{info, warn};

/// DNS resolver that filters out private and reserved addresses unless allow-listed.
pub struct SsrfSafeResolver {
    allowed_private_ips: Vec<IpAddr>,
}

impl SsrfSafeResolver {
    /// Entries that do not parse as IPs are ignored.
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed_private_ips: allowed.iter().filter_map(|s| s.parse().ok()).collect(),
        }
    }

    /// RFC 1918, loopback, link-local, broadcast, unspecified, the cloud
    /// metadata endpoint, and the IPv6 equivalents.
    pub fn is_private(ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => {
                v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_unspecified()
                    || *v4 == Ipv4Addr::new(169, 254, 169, 254)
            }
            IpAddr::V6(v6) => {
                if let Some(mapped) = v6.to_ipv4_mapped() {
                    return Self::is_private(&IpAddr::V4(mapped));
                }
                v6.is_loopback()
                    || v6.is_unspecified()
                    || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                    || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
            }
        }
    }

    fn permits(&self, ip: &IpAddr) -> bool {
        !Self::is_private(ip) || self.allowed_private_ips.contains(ip)
    }
}

impl Resolve for SsrfSafeResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = SsrfSafeResolver {
            allowed_private_ips: self.allowed_private_ips.clone(),
        };
        let hostname = name.as_str().to_string();

        Box::pin(async move {
            let resolved = tokio::net::lookup_host(format!("{hostname}:0"))
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;

            let mut permitted: Vec<SocketAddr> = Vec::new();
            for addr in resolved {
                let ip = addr.ip();
                if resolver.permits(&ip) {
                    if SsrfSafeResolver::is_private(&ip) {
                        info!(%ip, host = %hostname, "allowing configured private IP");
                    }
                    permitted.push(addr);
                } else {
                    warn!(%ip, host = %hostname, "SSRF blocked: resolved to private IP");
                }
            }

            if permitted.is_empty() {
                return Err(format!("SSRF blocked: {hostname} resolves only to private IPs").into());
            }
            let addrs: Addrs = Box::new(permitted.into_iter());
            Ok(addrs)
        })
    }
}
