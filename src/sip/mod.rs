/**
 * SIP header model used by the public address module.
 *
 * Parsing of wire messages and of individual header values is delegated to `rsip`;
 * the rest of the crate only sees the `Message` accessors below.
 */

pub mod processor;
pub mod response;
pub mod via;

/// name of the custom header some registrars use to report the public address
pub const DEFAULT_PUBIP_HEADER: &str = "X-pubip";

// Status Codes
pub(crate) mod status_code {
    /// Unauthorized (401)
    pub const UNAUTHORIZED: u16 = 401;

    /// Proxy Authentication Required (407)
    pub const PROXY_AUTHENTICATION_REQUIRED: u16 = 407;

    /// first status code of the failure classes (4xx, 5xx, 6xx)
    pub const FIRST_FAILURE: u16 = 400;
}

/**
 * Read-only accessors over an inbound SIP response.
 */
pub trait Message {
    /// value of the topmost Via header, if the message carries one
    fn via_header(&self) -> Option<&str>;

    fn status_code(&self) -> u16;

    /// value of the first header with the given name (case-insensitive)
    fn custom_header(&self, name: &str) -> Option<&str>;
}
