/**
 * Initialize configuration, using hierarchical configuration
 * https://docs.rs/config/latest/config/
 *
 * 1. First pubip.yaml is read
 * 2. Then pubip.{environment}.yaml is read
 * 3. Then pubip.local.yaml is read (this is normally used for dev and not checked in git)
 * 4. Finally, environment variables are read
 */
use config::{Config, ConfigError, Environment, File, FileFormat};
use environment_type::EnvironmentType;
use logformat_type::LogFormat;
use serde::Deserialize;

use crate::sip::DEFAULT_PUBIP_HEADER;

mod environment_type;
pub(crate) mod logformat_type;
mod loglevel_type;

/**
 * An account whose public address is tracked.
 *
 * Fields:
 * - `aor`: the address-of-record, e.g. `sip:alice@example.com`
 */
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub(crate) struct AccountSettings {
    pub(crate) aor: String,
}

/**
 * Represents the configuration settings.
 *
 * Fields:
 * - `environment`: The environment type (e.g., development, staging, or production).
 * - `listen_address`: The UDP address receiving copies of SIP responses (hostname:port format)
 * - `disable_listener`: Flag to disable the UDP listener.
 * - `fallback_header`: Custom header consulted when the Via header carries no received address.
 * - `local_address`: The local SIP socket, used to log the contact of the next REGISTER.
 * - `accounts`: The accounts to track.
 * - `log_format`: Full or compact terminal output.
 * - `log_level`: The logging level. By default, logging is inferred from environment type if no other settings are found.
 */
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Settings {
    pub(crate) environment: EnvironmentType,
    pub(crate) listen_address: String,
    pub(crate) disable_listener: bool,
    pub(crate) fallback_header: String,
    pub(crate) local_address: Option<String>,
    #[serde(default)]
    pub(crate) accounts: Vec<AccountSettings>,
    #[serde(deserialize_with = "logformat_type::deserialize")]
    pub(crate) log_format: LogFormat,
    #[serde(deserialize_with = "loglevel_type::deserialize")]
    pub(crate) log_level: slog::Level,
}

impl Settings {
    pub(crate) fn new() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    // `overrides` is a yaml document layered between the files and the environment
    fn build(overrides: Option<&str>) -> Result<Self, ConfigError> {
        let run_mode = EnvironmentType::current();

        let mut builder = Config::builder()
            // default config file
            .add_source(File::with_name("pubip.yaml").required(false))
            // environment-based config file
            .add_source(File::with_name(&format!("pubip.{}.yaml", run_mode.as_str())).required(false))
            // local config file (don't check this into source control)
            .add_source(File::with_name("pubip.local.yaml").required(false));

        if let Some(yaml) = overrides {
            builder = builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        }

        let s = builder
            .add_source(Environment::with_prefix("PUBIP"))
            .set_default("listen_address", "0.0.0.0:5099")?
            .set_default("disable_listener", false)?
            .set_default("fallback_header", DEFAULT_PUBIP_HEADER)?
            .set_default("log_format", LogFormat::Full.as_str())?
            .set_default("log_level", loglevel_type::as_str(run_mode.default_log_level()))?
            .set_default("environment", EnvironmentType::Production.as_str())?
            .build()?;

        s.try_deserialize()
    }
}
