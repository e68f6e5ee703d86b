/**
 * Public address discovery for SIP accounts.
 *
 * The public address is taken from the `received` parameter of the Via header of
 * registration challenges (401/407) and failures, with a custom header as fallback,
 * and kept per account so that the next REGISTER can advertise it.
 */
use std::net::SocketAddr;
use std::sync::Arc;

use slog::{debug, info, o, warn, Logger};

use crate::bus::{EventBus, HandlerId};
use crate::ua::{Account, AccountId};
use crate::Context;

pub mod addr;
pub mod contact;
pub mod decoder;
pub mod intake;
pub mod policy;
pub mod store;

use intake::Intake;
use store::{AccountStore, EntryHandle};

/**
 * The running module: the account store plus the intake handler subscribed to
 * the event bus. Created by `start`, torn down by `stop`.
 */
pub struct PubipModule {
    store: Arc<AccountStore>,
    bus: Arc<EventBus>,
    handler: Option<HandlerId>,
    logger: Logger,
}

impl PubipModule {
    /**
     * Create the account store and subscribe to the event bus.
     *
     * @param context The process context containing configuration and logger
     * @param bus The bus delivering protocol events
     * @return The running module
     */
    pub fn start(context: &Arc<Context>, bus: &Arc<EventBus>) -> Self {
        let logger = context.logger.new(o!("module" => "pubip"));
        let store = Arc::new(AccountStore::new());
        let intake = Intake::new(&store, &logger, &context.config.fallback_header);

        let local = match context.config.local_address.as_deref() {
            Some(raw) => match raw.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    warn!(logger, "ignoring local_address {}: {}", raw, e);
                    None
                }
            },
            None => None,
        };

        let handler_store = Arc::clone(&store);
        let handler_logger = logger.clone();
        let handler = bus.register(move |event| {
            let changes = intake.handle(event);
            if let Some(local) = local {
                for change in &changes {
                    let contact = contact::contact_address(&handler_store, change.account, local);
                    debug!(handler_logger, "contact for next REGISTER"; "aor" => &change.aor, "contact" => %contact);
                }
            }
        });

        info!(
            logger,
            "Public IP module loaded";
            "fallback_header" => &context.config.fallback_header
        );

        Self {
            store,
            bus: Arc::clone(bus),
            handler: Some(handler),
            logger,
        }
    }

    /**
     * Start tracking the public address of an account.
     */
    pub fn attach(&self, account: &dyn Account) -> EntryHandle {
        let handle = self.store.register(account.id());
        if handle.created {
            debug!(self.logger, "tracking account"; "aor" => account.aor(), "id" => %account.id());
        }
        handle
    }

    pub fn detach(&self, account: &dyn Account) {
        if self.store.unregister(account.id()) {
            debug!(self.logger, "stopped tracking account"; "aor" => account.aor());
        }
    }

    /**
     * The current public address of an account, to be used when building the
     * contact of the next outbound request.
     */
    pub fn public_addr(&self, account: AccountId) -> Option<addr::ExternalAddr> {
        self.store.get(account)
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /**
     * Unsubscribe from the bus and drop all entries. Calling it twice is harmless.
     */
    pub fn stop(&mut self) {
        if let Some(handler) = self.handler.take() {
            self.bus.unregister(handler);
            let entries = self.store.len();
            self.store.clear();
            info!(self.logger, "Public IP module unloaded"; "entries" => entries);
        }
    }
}

impl Drop for PubipModule {
    fn drop(&mut self) {
        self.stop();
    }
}
