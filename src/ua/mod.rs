/**
 * User agent accounts, as seen by the public address module.
 *
 * An account is only ever compared by identity. The address-of-record is carried
 * along for log output and for matching inbound responses to the account they
 * belong to.
 */
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/**
 * Opaque identity of an account.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(u64);

impl AccountId {
    /**
     * Allocate a process-unique account identity.
     */
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        AccountId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ua#{}", self.0)
    }
}

/**
 * The account accessors the public address module relies on.
 */
pub trait Account: Send + Sync {
    fn id(&self) -> AccountId;
    fn aor(&self) -> &str;
}

/**
 * A locally configured account.
 */
#[derive(Debug, Clone)]
pub struct UserAgent {
    id: AccountId,
    aor: String,
}

impl UserAgent {
    pub fn new(aor: impl Into<String>) -> Self {
        Self {
            id: AccountId::next(),
            aor: aor.into(),
        }
    }

    /**
     * Check whether an address-of-record refers to this account. The URI scheme
     * is optional on both sides and the comparison is case-insensitive.
     *
     * @param aor The address-of-record to compare against, e.g. taken from a To header
     * @return true if both name the same user at the same host
     */
    pub fn matches_aor(&self, aor: &str) -> bool {
        strip_scheme(&self.aor).eq_ignore_ascii_case(strip_scheme(aor))
    }
}

impl Account for UserAgent {
    fn id(&self) -> AccountId {
        self.id
    }

    fn aor(&self) -> &str {
        &self.aor
    }
}

fn strip_scheme(aor: &str) -> &str {
    let aor = aor.trim().trim_start_matches('<').trim_end_matches('>');
    aor.strip_prefix("sips:")
        .or_else(|| aor.strip_prefix("sip:"))
        .unwrap_or(aor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_ids_are_unique() {
        let alice = UserAgent::new("sip:alice@example.com");
        let alice_again = UserAgent::new("sip:alice@example.com");
        assert_ne!(alice.id(), alice_again.id());
        assert_eq!(alice.aor(), alice_again.aor());
    }

    #[test]
    fn test_matches_aor() {
        let ua = UserAgent::new("sip:alice@example.com");
        assert!(ua.matches_aor("sip:alice@example.com"));
        assert!(ua.matches_aor("alice@EXAMPLE.com"));
        assert!(ua.matches_aor("<sip:alice@example.com>"));
        assert!(!ua.matches_aor("sip:bob@example.com"));
        assert!(!ua.matches_aor("sip:alice@example.org"));
    }

    #[test]
    fn test_matches_aor_sips() {
        let ua = UserAgent::new("sips:carol@example.net");
        assert!(ua.matches_aor("sip:carol@example.net"));
        assert!(ua.matches_aor("carol@example.net"));
    }
}
