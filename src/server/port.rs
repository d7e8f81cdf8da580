//! Port specifications accepted by `listen_on_port`.
//!
//! ```text
//! 8080            all of `bind_host`, port 8080
//! 8080s           same, TLS requested
//! 0.0.0.0:8080    explicit host
//! [::1]:8080      explicit IPv6 host
//! 0               ephemeral port chosen by the OS
//! ```

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub host: Option<String>,
    pub port: u16,
    pub tls: bool,
}

impl PortSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || Error::InvalidPort(spec.to_string());

        let trimmed = spec.trim();
        let (rest, tls) = match trimmed.strip_suffix('s') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let host = host
                    .strip_prefix('[')
                    .and_then(|h| h.strip_suffix(']'))
                    .unwrap_or(host);
                if host.is_empty() {
                    return Err(invalid());
                }
                (Some(host.to_string()), port)
            }
            None => (None, rest),
        };

        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self { host, port, tls })
    }

    /// Port 0: the OS picks the actual port at bind time.
    pub fn is_ephemeral(&self) -> bool {
        self.port == 0
    }

    /// The form reported by `port()` once bound to `addr`.
    pub fn bound_display(&self, addr: SocketAddr) -> String {
        Self {
            host: self.host.clone(),
            port: addr.port(),
            tls: self.tls,
        }
        .to_string()
    }

    /// Whether binding this spec would clash with a socket already bound to
    /// `bound`: same port, and the same address or a wildcard on either side.
    /// Ephemeral specs never clash.
    pub fn overlaps(&self, default_host: &str, bound: SocketAddr) -> bool {
        if self.is_ephemeral() || self.port != bound.port() {
            return false;
        }

        let host = self.host.as_deref().unwrap_or(default_host);
        let Ok(addrs) = (host, self.port).to_socket_addrs() else {
            return false;
        };

        addrs.into_iter().any(|addr| {
            addr.ip() == bound.ip() || addr.ip().is_unspecified() || bound.ip().is_unspecified()
        })
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) if host.contains(':') => write!(f, "[{}]:{}", host, self.port)?,
            Some(host) => write!(f, "{}:{}", host, self.port)?,
            None => write!(f, "{}", self.port)?,
        }
        if self.tls {
            write!(f, "s")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_port() {
        let spec = PortSpec::parse("8080").unwrap();
        assert_eq!(spec, PortSpec { host: None, port: 8080, tls: false });
        assert_eq!(spec.to_string(), "8080");
    }

    #[test]
    fn tls_suffix() {
        let spec = PortSpec::parse("8443s").unwrap();
        assert!(spec.tls);
        assert_eq!(spec.port, 8443);
        assert_eq!(spec.to_string(), "8443s");
    }

    #[test]
    fn explicit_hosts() {
        let v4 = PortSpec::parse("0.0.0.0:9000").unwrap();
        assert_eq!(v4.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(v4.port, 9000);

        let v6 = PortSpec::parse("[::1]:9000").unwrap();
        assert_eq!(v6.host.as_deref(), Some("::1"));
        assert_eq!(v6.to_string(), "[::1]:9000");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "s", "http", "-1", "+80", "65536", ":80", "80:", "80x"] {
            assert!(
                matches!(PortSpec::parse(bad), Err(Error::InvalidPort(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn ephemeral_display_uses_bound_port() {
        let spec = PortSpec::parse("0").unwrap();
        assert!(spec.is_ephemeral());

        let addr: SocketAddr = "127.0.0.1:41234".parse().unwrap();
        assert_eq!(spec.bound_display(addr), "41234");

        let with_host = PortSpec::parse("127.0.0.1:0").unwrap();
        assert_eq!(with_host.bound_display(addr), "127.0.0.1:41234");
    }

    #[test]
    fn overlapping_binds() {
        let bound: SocketAddr = "127.0.0.1:41234".parse().unwrap();

        assert!(PortSpec::parse("41234").unwrap().overlaps("127.0.0.1", bound));
        assert!(PortSpec::parse("127.0.0.1:41234").unwrap().overlaps("0.0.0.0", bound));
        assert!(PortSpec::parse("0.0.0.0:41234").unwrap().overlaps("127.0.0.1", bound));

        assert!(!PortSpec::parse("41235").unwrap().overlaps("127.0.0.1", bound));
        assert!(!PortSpec::parse("127.0.0.2:41234").unwrap().overlaps("127.0.0.1", bound));
        assert!(!PortSpec::parse("0").unwrap().overlaps("127.0.0.1", bound));
    }
}
