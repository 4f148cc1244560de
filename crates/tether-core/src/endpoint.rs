use std::{
    fmt,
    net::{IpAddr, SocketAddr, ToSocketAddrs},
};

use crate::error::{ErrorKind, Result};

/// A (host, port) pair identifying a network destination.
///
/// Endpoints are plain values: they are created per call and resolved lazily
/// at connect/bind time. Resolution failure is reported to the caller, never
/// silently substituted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP address literal.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint from a host name (or IP literal) and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Resolves this endpoint to one or more connectable addresses.
    ///
    /// IP address literals are parsed directly without consulting the system
    /// resolver; anything else goes through DNS.
    ///
    /// # Returns
    /// All resolved socket addresses, in resolver order. An empty resolution
    /// set or a resolver failure is reported as a resolution error.
    ///
    /// # Examples
    /// ```
    /// use tether_core::Endpoint;
    ///
    /// let addrs = Endpoint::new("127.0.0.1", 8080).resolve().unwrap();
    /// assert_eq!(addrs[0].port(), 8080);
    /// ```
    pub fn resolve(&self) -> Result<Vec<SocketAddr>> {
        // Literal IPs skip the resolver round trip.
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, self.port)]);
        }

        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ErrorKind::Resolution {
                host: self.host.clone(),
                port: self.port,
                reason: e.to_string(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ErrorKind::Resolution {
                host: self.host.clone(),
                port: self.port,
                reason: "no addresses returned".into(),
            });
        }

        Ok(addrs)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_resolve_ipv4_literal() {
        let addrs = Endpoint::new("192.168.1.1", 8080).resolve().unwrap();
        assert_eq!(addrs, vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 8080)]);
    }

    #[test]
    fn test_resolve_ipv6_literal() {
        let addrs = Endpoint::new("::1", 8080).resolve().unwrap();
        assert_eq!(
            addrs,
            vec![SocketAddr::new(IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1)), 8080)]
        );
    }

    #[test]
    fn test_resolve_localhost() {
        // This should work on all platforms
        let addrs = Endpoint::new("localhost", 9000).resolve().unwrap();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|addr| addr.port() == 9000));
        // Localhost can resolve to either 127.0.0.1 or ::1
        assert!(addrs.iter().all(|addr| addr.ip().is_loopback()));
    }

    #[test]
    fn test_resolve_invalid_host() {
        // This hostname should not exist
        let result = Endpoint::new("this-hostname-should-not-exist-12345.invalid", 8080).resolve();
        assert!(matches!(result, Err(ErrorKind::Resolution { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(Endpoint::new("example.com", 443).to_string(), "example.com:443");
    }
}
