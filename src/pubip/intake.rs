/**
 * Entry point for protocol events delivered by the event bus.
 *
 * Each event is handled on its own: it is either filtered out right away, or the
 * decoder runs once and any result is resolved against the account store. Nothing
 * is buffered between events and no failure is reported back to the bus.
 */
use std::sync::Arc;

use slog::{debug, trace, Logger};

use crate::sip::status_code::{FIRST_FAILURE, PROXY_AUTHENTICATION_REQUIRED, UNAUTHORIZED};
use crate::sip::Message;
use crate::ua::Account;

use super::decoder;
use super::policy::{self, AddressChange};
use super::store::AccountStore;

/**
 * Event kinds published by the host.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Registering,
    RegisterOk,
    /// a REGISTER transaction ended with a final failure
    RegisterFail,
    /// any other response
    Response,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Registering => "REGISTERING",
            EventKind::RegisterOk => "REGISTER_OK",
            EventKind::RegisterFail => "REGISTER_FAIL",
            EventKind::Response => "RESPONSE",
        }
    }
}

/**
 * One protocol event.
 *
 * Fields:
 * - `kind`: what happened
 * - `message`: the response that triggered it
 * - `account`: the account the response belongs to, if the host could tell
 */
pub struct Event<'a> {
    pub kind: EventKind,
    pub message: &'a dyn Message,
    pub account: Option<&'a dyn Account>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    FilteredOut,
    Processing,
}

/**
 * Decide whether an event is worth decoding.
 *
 * Only registration failures and authentication challenges are looked at, and
 * only when the response is a failure and carries a Via header.
 */
pub fn classify(kind: EventKind, message: &dyn Message) -> Disposition {
    let status = message.status_code();
    let challenge = status == UNAUTHORIZED || status == PROXY_AUTHENTICATION_REQUIRED;

    if kind != EventKind::RegisterFail && !challenge {
        return Disposition::FilteredOut;
    }

    if status < FIRST_FAILURE || message.via_header().is_none() {
        return Disposition::FilteredOut;
    }

    Disposition::Processing
}

/**
 * The event handler of the public address module.
 */
#[derive(Clone)]
pub struct Intake {
    store: Arc<AccountStore>,
    logger: Logger,
    fallback_header: String,
}

impl Intake {
    pub fn new(store: &Arc<AccountStore>, logger: &Logger, fallback_header: &str) -> Self {
        Self {
            store: Arc::clone(store),
            logger: logger.clone(),
            fallback_header: fallback_header.to_string(),
        }
    }

    /**
     * Handle one event.
     *
     * @param event The event as delivered by the bus
     * @return The address changes it caused, usually none
     */
    pub fn handle(&self, event: &Event<'_>) -> Vec<AddressChange> {
        let status = event.message.status_code();

        if classify(event.kind, event.message) == Disposition::FilteredOut {
            trace!(self.logger, "ignoring event"; "event" => event.kind.as_str(), "status" => status);
            return Vec::new();
        }

        let candidate = match decoder::decode(event.message, &self.fallback_header) {
            Ok(candidate) => candidate,
            Err(e) => {
                debug!(
                    self.logger,
                    "no public IP in response";
                    "event" => event.kind.as_str(), "status" => status, "error" => %e
                );
                return Vec::new();
            }
        };

        let account = match event.account {
            Some(account) => account,
            None => {
                debug!(self.logger, "public IP {} seen for unknown account", candidate.addr; "status" => status);
                return Vec::new();
            }
        };

        policy::apply(&self.store, &self.logger, account, &candidate)
    }
}
