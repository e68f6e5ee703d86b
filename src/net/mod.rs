/**
 * Network related functionality
 *
 */
use std::sync::Arc;

use crate::{sip::processor::MessageProcessor, Context};
use slog::{debug, error, info};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// a datagram larger than this is truncated by the kernel and will fail to parse
const MAX_DATAGRAM_SIZE: usize = 65535;

/**
 * Network server receiving captured SIP traffic over UDP.
 */
pub(crate) struct NetworkServer<T: MessageProcessor> {
    context: Arc<Context>,
    processor: T,
}

impl<T: MessageProcessor> NetworkServer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /**
     * Initialize a new network server. The context contains global logger
     * and configuration settings, and the message processor is used to
     * do protocol-specific message processing (in this case SIP)
     */
    pub fn new(context: &Arc<Context>, message_processor: T) -> Self {
        Self {
            context: Arc::clone(context),
            processor: message_processor,
        }
    }

    /**
     * Binds the configured UDP address and spawns the receive loop.
     *
     * @return A JoinHandle for the spawned listener task, or an error if the bind fails
     */
    pub async fn setup_udp_listener(&self) -> Result<JoinHandle<()>, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind(&self.context.config.listen_address).await?;
        info!(self.context.logger, "Listening for SIP responses"; "address" => %socket.local_addr()?);

        let context = Arc::clone(&self.context);
        let processor = self.processor.clone();

        let udp_handle = tokio::spawn(async move {
            Self::handle_udp_socket(context, processor, socket).await;
        });
        Ok(udp_handle)
    }

    /**
     * Handles UDP messages
     *
     * Receives datagrams and hands each one to the processor. A datagram that
     * cannot be processed is dropped, the loop only ends when the task is aborted.
     *
     * @param context The process context, used for logging
     * @param processor The message processor to handle the SIP messages
     * @param socket The UDP socket to receive on
     */
    async fn handle_udp_socket(context: Arc<Context>, processor: T, socket: UdpSocket) {
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (n, source) = match socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    error!(context.logger, "UDP receive error: {}", e);
                    continue;
                }
            };

            if let Err(e) = processor.process_message(&buffer[..n], source).await {
                debug!(context.logger, "dropping datagram from {}: {}", source, e);
            }
        }
    }
}
