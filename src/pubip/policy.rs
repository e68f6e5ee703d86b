use slog::{debug, info, trace, Logger};

use crate::ua::{Account, AccountId};

use super::addr::{Candidate, ExternalAddr, Strategy};
use super::store::{AccountStore, CasOutcome, StoreError};

/**
 * The record emitted for every accepted address change.
 *
 * Fields:
 * - `account`: the entry that changed
 * - `aor`: address-of-record of the owning account
 * - `previous`: the address replaced, None if nothing was known yet
 * - `address`: the new address
 * - `strategy`: which decoder strategy produced it
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressChange {
    pub account: AccountId,
    pub aor: String,
    pub previous: Option<ExternalAddr>,
    pub address: ExternalAddr,
    pub strategy: Strategy,
}

/**
 * Resolve a candidate against the store entry of the account.
 *
 * An entry whose host differs from the candidate is overwritten and produces
 * exactly one change record, which is also logged at info level. Nothing else
 * happens here; re-registration is left to whoever reads the store next.
 *
 * @param store The account store
 * @param logger The module logger
 * @param account The account the triggering event belongs to
 * @param candidate The decoded address
 * @return The accepted changes, empty if the address was already known
 */
pub fn apply(
    store: &AccountStore,
    logger: &Logger,
    account: &dyn Account,
    candidate: &Candidate,
) -> Vec<AddressChange> {
    match store.compare_and_set(account.id(), &candidate.addr) {
        Ok(CasOutcome::Changed { previous }) => {
            info!(
                logger,
                "updated public IP for {}: {}", account.aor(), candidate.addr;
                "aor" => account.aor(),
                "previous" => previous.map(|p| p.to_string()).unwrap_or_else(|| "none".into()),
                "address" => %candidate.addr,
                "source" => candidate.strategy.as_str()
            );
            vec![AddressChange {
                account: account.id(),
                aor: account.aor().to_string(),
                previous,
                address: candidate.addr,
                strategy: candidate.strategy,
            }]
        }
        Ok(CasOutcome::Unchanged) => {
            trace!(logger, "public IP unchanged"; "aor" => account.aor(), "address" => %candidate.addr);
            Vec::new()
        }
        Err(StoreError::NotFound(_)) => {
            // detached while the event was in flight
            debug!(logger, "account has no entry"; "aor" => account.aor());
            Vec::new()
        }
    }
}
