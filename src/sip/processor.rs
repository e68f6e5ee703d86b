/**
 * A message processor for SIP responses captured off the wire.
 *
 * Every response is turned into an event and published on the bus; requests are
 * of no interest here.
 */
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::trace;

use crate::bus::EventBus;
use crate::pubip::intake::{Event, EventKind};
use crate::ua::{Account, UserAgent};
use crate::{utils, Context};

use super::response::InboundResponse;
use super::Message;

pub type ProcessError = Box<dyn std::error::Error + Send + Sync>;

/**
 * This trait defines an asynchronous method for processing one captured datagram.
 */
#[async_trait]
pub trait MessageProcessor {
    /**
     * @param input The raw datagram
     * @param source Where the datagram came from
     * @return The kind of event published, None if the message was not a response
     */
    async fn process_message(
        &self,
        input: &[u8],
        source: SocketAddr,
    ) -> Result<Option<EventKind>, ProcessError>;
}

#[derive(Clone)]
pub(crate) struct SipTapProcessor {
    context: Arc<Context>,
    agents: Arc<Vec<UserAgent>>,
    bus: Arc<EventBus>,
}

impl SipTapProcessor {
    /**
     * Creates a new `SipTapProcessor` instance.
     *
     * @param context The process context containing configuration and logger
     * @param agents The configured accounts, responses are matched to them by AOR
     * @param bus The bus events are published on
     */
    pub fn new(context: &Arc<Context>, agents: &Arc<Vec<UserAgent>>, bus: &Arc<EventBus>) -> Self {
        Self {
            context: Arc::clone(context),
            agents: Arc::clone(agents),
            bus: Arc::clone(bus),
        }
    }

    fn find_agent(&self, aor: &str) -> Option<&UserAgent> {
        self.agents.iter().find(|ua| ua.matches_aor(aor))
    }
}

#[async_trait]
impl MessageProcessor for SipTapProcessor {
    async fn process_message(
        &self,
        input: &[u8],
        source: SocketAddr,
    ) -> Result<Option<EventKind>, ProcessError> {
        trace!(self.context.logger, "-->-- [{}]: {}", source, utils::printable(input));

        let message = rsip::SipMessage::try_from(input)
            .map_err(|e| format!("unparsable SIP message from {source}: {e}"))?;

        let response = match message {
            rsip::SipMessage::Response(response) => response,
            rsip::SipMessage::Request(request) => {
                trace!(self.context.logger, "ignoring {} request from {}", request.method, source);
                return Ok(None);
            }
        };

        let inbound = InboundResponse::from_response(&response);
        let kind = inbound.event_kind();
        let agent = inbound.to_aor().and_then(|aor| self.find_agent(aor));

        trace!(
            self.context.logger,
            "-->-- [{}] SIP {} {}", source, inbound.status_code(), kind.as_str();
            "aor" => agent.map(|ua| ua.aor()).unwrap_or("unknown")
        );

        self.bus.publish(&Event {
            kind,
            message: &inbound,
            account: agent.map(|ua| ua as &dyn Account),
        });

        Ok(Some(kind))
    }
}
