/**
 * This module defines the main entry point for the public IP daemon.
 *
 * The daemon receives copies of the SIP responses seen by the configured
 * accounts, learns the public address of each account from them and logs
 * every change.
 */
use slog::{error, info, Logger};
use std::sync::Arc;

use bus::EventBus;
use pubip::PubipModule;
use sip::processor::SipTapProcessor;
use ua::{Account, UserAgent};

mod bus;
mod config;
mod logging;
mod net;
mod pubip;
mod sip;
mod ua;
mod utils;

/**
 * Represents the context for the daemon.
 *
 * Fields:
 * - `config`: The configuration settings.
 * - `logger`: The root logger instance.
 */
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) config: config::Settings,
    pub(crate) logger: Logger,
}

pub struct PubipDaemon {
    context: Arc<Context>,
}

impl PubipDaemon {
    /**
     * Creates a new `PubipDaemon` instance.
     *
     * This function initializes the configuration and logger, and creates
     * a new `PubipDaemon` instance with the initialized context.
     *
     * @return An `Arc` containing the new `PubipDaemon` instance.
     */
    pub fn new() -> Arc<Self> {
        let cfg = config::Settings::new().expect("Failed to load configuration");

        let context = Context {
            config: cfg.clone(),
            logger: logging::init_logger(&cfg),
        };

        Arc::new(Self {
            context: Arc::new(context),
        })
    }

    /**
     * Run the daemon.
     *
     * Loads the public IP module, attaches the configured accounts and, unless
     * disabled, listens for SIP responses. It blocks until interrupted.
     *
     * @return A `Result` indicating success or failure.
     */
    pub async fn run(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error>> {
        let mut handles = vec![];

        info!(self.context.logger, "Starting public IP daemon"; "environment" => self.context.config.environment.as_str());

        let bus = Arc::new(EventBus::new());
        let mut module = PubipModule::start(&self.context, &bus);

        let agents: Arc<Vec<UserAgent>> = Arc::new(
            self.context
                .config
                .accounts
                .iter()
                .map(|account| UserAgent::new(account.aor.as_str()))
                .collect(),
        );
        for agent in agents.iter() {
            module.attach(agent);
        }

        if !self.context.config.disable_listener {
            let processor = SipTapProcessor::new(&self.context, &agents, &bus);
            let network_server = net::NetworkServer::new(&self.context, processor);
            handles.push(network_server.setup_udp_listener().await?);
        }

        tokio::signal::ctrl_c().await?;
        info!(self.context.logger, "Shutting down");

        for handle in handles {
            handle.abort();
        }
        for agent in agents.iter() {
            let public = module
                .public_addr(agent.id())
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "none".into());
            info!(self.context.logger, "account public IP"; "aor" => agent.aor(), "address" => public);
            module.detach(agent);
        }
        module.stop();
        Ok(())
    }
}

/**
 * The main entry point for the application, it creates
 * the daemon object and passes control to it.
 */
#[tokio::main]
async fn main() {
    let daemon = PubipDaemon::new();
    let logger = daemon.context.logger.clone();
    if let Err(e) = daemon.run().await {
        error!(logger, "daemon failed: {}", e);
    }
}
