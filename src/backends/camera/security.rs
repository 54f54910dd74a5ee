// SPDX-License-Identifier: GPL-3.0-only

//! Secure-context evaluation
//!
//! Camera access is only attempted from an encrypted or local origin. The
//! platform's own `isSecureContext` flag is honoured first; the origin check
//! covers hosts that report the flag unreliably.

use std::net::{IpAddr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    /// Platform-reported secure-context flag
    pub is_secure_context: bool,
    /// Lowercased scheme without `://`
    pub scheme: String,
    /// Lowercased host without port or brackets
    pub host: String,
}

impl SecurityContext {
    /// A context known to be trusted (e.g. a native host)
    pub fn trusted() -> Self {
        Self {
            is_secure_context: true,
            scheme: "app".to_string(),
            host: "localhost".to_string(),
        }
    }

    /// Build from an origin such as `https://example.com:8443`
    pub fn from_origin(origin: &str, is_secure_context: bool) -> Self {
        let origin = origin.trim();
        let (scheme, rest) = match origin.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (String::new(), origin),
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit('@').next().unwrap_or_default();
        let host = if let Some(stripped) = authority.strip_prefix('[') {
            stripped.split(']').next().unwrap_or_default()
        } else {
            authority.split(':').next().unwrap_or_default()
        };

        Self {
            is_secure_context,
            scheme,
            host: host.to_ascii_lowercase(),
        }
    }

    /// Whether sensitive device access is allowed from this context
    pub fn is_trusted(&self) -> bool {
        if self.is_secure_context {
            return true;
        }
        if matches!(self.scheme.as_str(), "https" | "wss" | "file") {
            return true;
        }
        self.is_local_host()
    }

    fn is_local_host(&self) -> bool {
        if self.host == "localhost" || self.host.ends_with(".localhost") {
            return true;
        }
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => addr.is_loopback(),
            Ok(IpAddr::V6(addr)) => addr == Ipv6Addr::LOCALHOST,
            Err(_) => false,
        }
    }
}
