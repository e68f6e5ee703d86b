/**
 * Decoding of a single Via header value, see RFC 3261 Section 20.42 and
 * RFC 3581 for the `rport` parameter.
 *
 * https://datatracker.ietf.org/doc/html/rfc3261#section-20.42
 * https://datatracker.ietf.org/doc/html/rfc3581
 *
 * The value is split by hand: IPv6 literals in the sent-by and in `received`
 * carry colons that a generic param tokenizer cuts short.
 */
use std::net::IpAddr;

use thiserror::Error;

/**
 * The parts of a Via value relevant to NAT discovery.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViaParams {
    /// the `received` parameter added by the first hop
    pub received: Option<IpAddr>,
    /// the `rport` parameter, when it carries a value
    pub rport: Option<u16>,
    /// the port of the sent-by field
    pub sent_by_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViaError {
    #[error("invalid Via header: {0}")]
    Syntax(String),

    #[error("invalid received parameter: {0}")]
    Received(String),
}

/**
 * Decode a Via header value (without the `Via:` name).
 *
 * Only the first via-parm is looked at when several are joined with commas.
 *
 * @param raw The header value, e.g. `SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK1;received=203.0.113.7`
 * @return The decoded parameters, or an error if the value or its received parameter is malformed
 */
pub fn decode(raw: &str) -> Result<ViaParams, ViaError> {
    let first = raw.split(',').next().unwrap_or_default().trim();
    let mut parts = first.split(';');
    let head = parts.next().unwrap_or_default().trim();

    let (protocol, sent_by) = head
        .split_once(|c: char| c.is_ascii_whitespace())
        .ok_or_else(|| ViaError::Syntax(format!("missing sent-by in '{head}'")))?;
    check_protocol(protocol.trim())?;
    let sent_by_port = sent_by_port(sent_by.trim())?;

    let mut received = None;
    let mut rport = None;
    for param in parts {
        let (name, value) = match param.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => continue,
        };

        if name.eq_ignore_ascii_case("received") {
            let literal = value.trim_start_matches('[').trim_end_matches(']');
            let ip = literal
                .parse::<IpAddr>()
                .map_err(|err| ViaError::Received(format!("'{value}': {err}")))?;
            received = Some(ip);
        } else if name.eq_ignore_ascii_case("rport") {
            rport = value.parse::<u16>().ok();
        }
    }

    Ok(ViaParams {
        received,
        rport,
        sent_by_port,
    })
}

// sent-protocol is `SIP/2.0/<transport>`
fn check_protocol(protocol: &str) -> Result<(), ViaError> {
    let mut tokens = protocol.split('/').map(str::trim);
    match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
        (Some(name), Some(version), Some(transport), None)
            if !name.is_empty() && !version.is_empty() && !transport.is_empty() =>
        {
            Ok(())
        }
        _ => Err(ViaError::Syntax(format!("bad sent-protocol '{protocol}'"))),
    }
}

fn sent_by_port(sent_by: &str) -> Result<Option<u16>, ViaError> {
    if sent_by.is_empty() {
        return Err(ViaError::Syntax("empty sent-by".to_string()));
    }

    let port = if let Some(rest) = sent_by.strip_prefix('[') {
        let (_, after) = rest
            .split_once(']')
            .ok_or_else(|| ViaError::Syntax(format!("unterminated IPv6 reference '{sent_by}'")))?;
        after.strip_prefix(':')
    } else {
        match sent_by.split_once(':') {
            // a bare IPv6 address has no port
            Some((_, port)) if !port.contains(':') => Some(port),
            _ => None,
        }
    };

    match port {
        Some(port) => port
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|err| ViaError::Syntax(format!("bad sent-by port '{port}': {err}"))),
        None => Ok(None),
    }
}
