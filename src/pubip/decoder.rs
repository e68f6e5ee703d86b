/**
 * Extraction of the public address from an inbound response.
 *
 * Two strategies are tried in a fixed order:
 * 1. the `received` parameter of the topmost Via header
 * 2. a custom header holding an address literal, only if (1) failed for any reason
 *
 * The caller only ever sees the outcome of the strategy that ran last.
 */
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::sip::{via, Message};

use super::addr::{Candidate, ExternalAddr, Strategy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// header present but syntactically invalid
    #[error("malformed header: {0}")]
    Malformed(String),

    /// header parsed but carries no usable address
    #[error("header carries no address")]
    NoAddress,

    /// header absent
    #[error("header not found")]
    NotFound,
}

/**
 * Extract the public address from a Via header value.
 *
 * The port is the `rport` value when the first hop filled it in, otherwise the
 * sent-by port.
 *
 * @param raw The Via header value
 * @return The specified address recorded by the `received` parameter
 */
pub fn extract_from_via(raw: &str) -> Result<ExternalAddr, DecodeError> {
    let params = via::decode(raw).map_err(|err| DecodeError::Malformed(err.to_string()))?;

    let ip = params.received.ok_or(DecodeError::NoAddress)?;
    let addr = ExternalAddr::new(ip, params.rport.or(params.sent_by_port));
    if !addr.is_specified() {
        return Err(DecodeError::NoAddress);
    }

    Ok(addr)
}

/**
 * Extract the public address from a custom header, e.g. `X-pubip: 198.51.100.9`.
 *
 * @param msg The inbound message
 * @param name The custom header name
 * @return The specified address held by the header
 */
pub fn extract_from_header(msg: &dyn Message, name: &str) -> Result<ExternalAddr, DecodeError> {
    let value = msg.custom_header(name).ok_or(DecodeError::NotFound)?;
    let addr = parse_address_literal(value)?;
    if !addr.is_specified() {
        return Err(DecodeError::NoAddress);
    }

    Ok(addr)
}

/**
 * Run both strategies in order.
 *
 * @param msg The inbound message
 * @param fallback_header Name of the custom header used when the Via strategy fails
 * @return The candidate, or the error of the fallback strategy
 */
pub fn decode(msg: &dyn Message, fallback_header: &str) -> Result<Candidate, DecodeError> {
    let primary = match msg.via_header() {
        Some(raw) => extract_from_via(raw),
        None => Err(DecodeError::NotFound),
    };

    if let Ok(addr) = primary {
        return Ok(Candidate {
            addr,
            strategy: Strategy::ViaReceived,
        });
    }

    extract_from_header(msg, fallback_header).map(|addr| Candidate {
        addr,
        strategy: Strategy::CustomHeader,
    })
}

// accepts `ip`, `ip:port`, `[v6]` and `[v6]:port`
fn parse_address_literal(value: &str) -> Result<ExternalAddr, DecodeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DecodeError::NoAddress);
    }

    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(ExternalAddr::from(addr));
    }

    let bare = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    bare.parse::<IpAddr>()
        .map(|ip| ExternalAddr::new(ip, None))
        .map_err(|_| DecodeError::Malformed(format!("not an address literal: {value}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::net::{Ipv4Addr, Ipv6Addr};

    use rand::Rng;

    use super::*;

    /**
     * A hand-built message that counts how often its accessors are used.
     */
    #[derive(Default)]
    pub(crate) struct TestMessage {
        pub status: u16,
        pub via: Option<String>,
        pub headers: Vec<(String, String)>,
        pub via_reads: Cell<usize>,
        pub header_reads: Cell<usize>,
    }

    impl TestMessage {
        pub fn new(status: u16) -> Self {
            Self {
                status,
                ..Default::default()
            }
        }

        pub fn with_via(mut self, via: &str) -> Self {
            self.via = Some(via.to_string());
            self
        }

        pub fn with_header(mut self, name: &str, value: &str) -> Self {
            self.headers.push((name.to_string(), value.to_string()));
            self
        }
    }

    impl Message for TestMessage {
        fn via_header(&self) -> Option<&str> {
            self.via_reads.set(self.via_reads.get() + 1);
            self.via.as_deref()
        }

        fn status_code(&self) -> u16 {
            self.status
        }

        fn custom_header(&self, name: &str) -> Option<&str> {
            self.header_reads.set(self.header_reads.get() + 1);
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    fn via_with_received(received: &str) -> String {
        format!("SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK74bf9;received={received}")
    }

    fn random_public_v4() -> Ipv4Addr {
        let mut rng = rand::thread_rng();
        Ipv4Addr::new(rng.gen_range(1..=223), rng.gen(), rng.gen(), rng.gen_range(1..=254))
    }

    #[test]
    fn test_via_received() {
        let addr = extract_from_via(&via_with_received("203.0.113.7")).unwrap();
        assert_eq!(addr.ip(), "203.0.113.7".parse::<IpAddr>().unwrap());
        assert_eq!(addr.port(), Some(5060));
    }

    #[test]
    fn test_via_rport_wins_over_sent_by_port() {
        let addr = extract_from_via(
            "SIP/2.0/UDP 10.0.0.2:5060;rport=40123;branch=z9hG4bK74bf9;received=203.0.113.7",
        )
        .unwrap();
        assert_eq!(addr.port(), Some(40123));
    }

    #[test]
    fn test_via_without_received() {
        let err = extract_from_via("SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK74bf9").unwrap_err();
        assert_eq!(err, DecodeError::NoAddress);
    }

    #[test]
    fn test_via_unspecified_received() {
        let err = extract_from_via(&via_with_received("0.0.0.0")).unwrap_err();
        assert_eq!(err, DecodeError::NoAddress);
    }

    #[test]
    fn test_via_malformed_received() {
        let err = extract_from_via(&via_with_received("not-an-ip")).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_header_literals() {
        let cases = [
            ("198.51.100.9", "198.51.100.9", None),
            ("198.51.100.9:5070", "198.51.100.9", Some(5070)),
            (" 198.51.100.9 ", "198.51.100.9", None),
            ("2001:db8::9", "2001:db8::9", None),
            ("[2001:db8::9]", "2001:db8::9", None),
            ("[2001:db8::9]:5070", "2001:db8::9", Some(5070)),
        ];

        for (literal, ip, port) in cases {
            let msg = TestMessage::new(401).with_header("X-pubip", literal);
            let addr = extract_from_header(&msg, "X-pubip").unwrap();
            assert_eq!(addr.ip(), ip.parse::<IpAddr>().unwrap(), "{literal}");
            assert_eq!(addr.port(), port, "{literal}");
        }
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let msg = TestMessage::new(401).with_header("x-PubIP", "198.51.100.9");
        assert!(extract_from_header(&msg, "X-pubip").is_ok());
    }

    #[test]
    fn test_header_errors() {
        let msg = TestMessage::new(401);
        assert_eq!(extract_from_header(&msg, "X-pubip").unwrap_err(), DecodeError::NotFound);

        let msg = TestMessage::new(401).with_header("X-pubip", "");
        assert_eq!(extract_from_header(&msg, "X-pubip").unwrap_err(), DecodeError::NoAddress);

        let msg = TestMessage::new(401).with_header("X-pubip", "[::]:5060");
        assert_eq!(extract_from_header(&msg, "X-pubip").unwrap_err(), DecodeError::NoAddress);

        let msg = TestMessage::new(401).with_header("X-pubip", "somewhere.example.com");
        assert!(matches!(
            extract_from_header(&msg, "X-pubip").unwrap_err(),
            DecodeError::Malformed(_)
        ));
    }

    #[test]
    fn test_primary_wins_when_it_succeeds() {
        for _ in 0..64 {
            let ip = random_public_v4();
            let msg = TestMessage::new(401)
                .with_via(&via_with_received(&ip.to_string()))
                .with_header("X-pubip", "198.51.100.9");

            let candidate = decode(&msg, "X-pubip").unwrap();
            assert_eq!(candidate.strategy, Strategy::ViaReceived);
            assert_eq!(candidate.addr.ip(), IpAddr::V4(ip));
            assert_eq!(msg.header_reads.get(), 0);
        }
    }

    #[test]
    fn test_primary_wins_with_ipv6_received() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let mut octets: [u8; 16] = rng.gen();
            octets[0] = 0x20;
            octets[1] = 0x01;
            let ip = Ipv6Addr::from(octets);
            let rport: u16 = rng.gen_range(1024..=65535);
            let via = format!("SIP/2.0/UDP [fd00::2]:5060;branch=z9hG4bK74bf9;rport={rport};received={ip}");
            let msg = TestMessage::new(401)
                .with_via(&via)
                .with_header("X-pubip", "198.51.100.9");

            let candidate = decode(&msg, "X-pubip").unwrap();
            assert_eq!(candidate.strategy, Strategy::ViaReceived, "{via}");
            assert_eq!(candidate.addr.ip(), IpAddr::V6(ip));
            assert_eq!(candidate.addr.port(), Some(rport));
            assert_eq!(msg.header_reads.get(), 0);
        }
    }

    #[test]
    fn test_via_ipv6_received() {
        let addr = extract_from_via(&via_with_received("2001:db8::7")).unwrap();
        assert_eq!(addr.ip(), "2001:db8::7".parse::<IpAddr>().unwrap());
        assert_eq!(addr.port(), Some(5060));
        assert_eq!(addr.to_string(), "[2001:db8::7]:5060");
    }

    #[test]
    fn test_fallback_when_primary_fails() {
        let primaries = [
            Some(via_with_received("not-an-ip")),
            Some(via_with_received("0.0.0.0")),
            Some("SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK74bf9".to_string()),
            None,
        ];

        let mut rng = rand::thread_rng();
        for primary in primaries {
            let mut octets: [u8; 16] = rng.gen();
            octets[0] = 0x20;
            octets[1] = 0x01;
            let ip = Ipv6Addr::from(octets);
            let mut msg = TestMessage::new(407).with_header("X-pubip", &ip.to_string());
            msg.via = primary;

            let candidate = decode(&msg, "X-pubip").unwrap();
            assert_eq!(candidate.strategy, Strategy::CustomHeader);
            assert_eq!(candidate.addr.ip(), IpAddr::V6(ip));
        }
    }

    #[test]
    fn test_only_fallback_error_is_reported() {
        let msg = TestMessage::new(401).with_via(&via_with_received("not-an-ip"));
        assert_eq!(decode(&msg, "X-pubip").unwrap_err(), DecodeError::NotFound);

        let msg = TestMessage::new(401)
            .with_via("SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK74bf9")
            .with_header("X-pubip", "garbage");
        assert!(matches!(decode(&msg, "X-pubip").unwrap_err(), DecodeError::Malformed(_)));
    }

    #[test]
    fn test_configured_fallback_name() {
        let msg = TestMessage::new(401)
            .with_header("X-pubip", "198.51.100.9")
            .with_header("X-Public-Address", "192.0.2.44");

        let candidate = decode(&msg, "X-Public-Address").unwrap();
        assert_eq!(candidate.addr.ip(), "192.0.2.44".parse::<IpAddr>().unwrap());
    }
}
