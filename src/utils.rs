/**
 * Various misc. utility functions
 */

/**
 * Renders a datagram as a single log-friendly line: CR and LF are escaped and
 * any other non-printable byte is shown as `\xNN`. Usually used in trace logs.
 *
 * @param buffer The raw bytes.
 * @return A `String` safe to embed in a single log line.
 */
pub(crate) fn printable(buffer: &[u8]) -> String {
    buffer
        .iter()
        .map(|&byte| match byte {
            b'\r' => "\\r".to_string(),
            b'\n' => "\\n".to_string(),
            0x20..=0x7e => (byte as char).to_string(),
            _ => format!("\\x{:02x}", byte),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable() {
        assert_eq!(printable(b"SIP/2.0 401 Unauthorized\r\n"), "SIP/2.0 401 Unauthorized\\r\\n");
        assert_eq!(printable(&[0x00, b'a', 0xff]), "\\x00a\\xff");
        assert_eq!(printable(b""), "");
    }
}
