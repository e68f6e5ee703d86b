use std::fmt;
use std::net::{IpAddr, SocketAddr};

/**
 * An externally visible address: an IP and, when the source carried one, a port.
 *
 * Two addresses describe the same host when their IPs are equal; the port never
 * takes part in change detection.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalAddr {
    ip: IpAddr,
    port: Option<u16>,
}

impl ExternalAddr {
    pub fn new(ip: IpAddr, port: Option<u16>) -> Self {
        Self {
            ip,
            port: port.filter(|&p| p != 0),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    #[cfg(test)]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// false for the wildcard addresses (0.0.0.0 and ::)
    pub fn is_specified(&self) -> bool {
        !self.ip.is_unspecified()
    }

    pub fn same_host(&self, other: &ExternalAddr) -> bool {
        self.ip == other.ip
    }
}

impl From<SocketAddr> for ExternalAddr {
    fn from(addr: SocketAddr) -> Self {
        ExternalAddr::new(addr.ip(), Some(addr.port()))
    }
}

impl fmt::Display for ExternalAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, self.port) {
            (ip, Some(port)) => write!(f, "{}", SocketAddr::new(ip, port)),
            (IpAddr::V6(ip), None) => write!(f, "[{}]", ip),
            (IpAddr::V4(ip), None) => write!(f, "{}", ip),
        }
    }
}

/**
 * Where a candidate address was found.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// the `received` parameter of the topmost Via header
    ViaReceived,
    /// a custom header carrying an address literal
    CustomHeader,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ViaReceived => "via-received",
            Strategy::CustomHeader => "custom-header",
        }
    }
}

/**
 * A freshly decoded address, consumed by the update policy right away.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub addr: ExternalAddr,
    pub strategy: Strategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let v4 = ExternalAddr::new("203.0.113.7".parse().unwrap(), Some(5060));
        assert_eq!(v4.to_string(), "203.0.113.7:5060");

        let v4_bare = ExternalAddr::new("203.0.113.7".parse().unwrap(), None);
        assert_eq!(v4_bare.to_string(), "203.0.113.7");

        let v6 = ExternalAddr::new("2001:db8::7".parse().unwrap(), Some(5062));
        assert_eq!(v6.to_string(), "[2001:db8::7]:5062");

        let v6_bare = ExternalAddr::new("2001:db8::7".parse().unwrap(), None);
        assert_eq!(v6_bare.to_string(), "[2001:db8::7]");
    }

    #[test]
    fn test_zero_port_is_no_port() {
        let addr = ExternalAddr::new("198.51.100.9".parse().unwrap(), Some(0));
        assert_eq!(addr.port(), None);
    }

    #[test]
    fn test_same_host_ignores_port() {
        let a = ExternalAddr::new("203.0.113.7".parse().unwrap(), Some(5060));
        let b = ExternalAddr::new("203.0.113.7".parse().unwrap(), Some(40000));
        let c = ExternalAddr::new("203.0.113.8".parse().unwrap(), Some(5060));
        assert!(a.same_host(&b));
        assert!(!a.same_host(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_unspecified() {
        assert!(!ExternalAddr::new("0.0.0.0".parse().unwrap(), None).is_specified());
        assert!(!ExternalAddr::new("::".parse().unwrap(), Some(5060)).is_specified());
        assert!(ExternalAddr::new("192.0.2.1".parse().unwrap(), None).is_specified());
    }
}
