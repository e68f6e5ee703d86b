/**
 * Initializes the logger
 *
 * https://docs.rs/slog/latest/slog/
 *
 */
use std::sync::Mutex;

use crate::config::{logformat_type::LogFormat, Settings};
use slog::{o, Drain, LevelFilter, Logger};
use slog_async::Async;
use slog_term::{CompactFormat, FullFormat, TermDecorator};

/**
 * Initializes the logger.
 *
 * Records go through an async drain to the terminal, in the configured
 * layout, and are filtered by the configured level.
 *
 * @param cfg The configuration settings containing the log level and format.
 * @return A `Logger` instance configured with the specified log level.
 */
pub(crate) fn init_logger(cfg: &Settings) -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = match cfg.log_format {
        LogFormat::Full => Async::new(FullFormat::new(decorator).build().fuse()).build().fuse(),
        LogFormat::Compact => Async::new(CompactFormat::new(decorator).build().fuse()).build().fuse(),
    };

    let drain = LevelFilter::new(drain, cfg.log_level).fuse();
    Logger::root(Mutex::new(drain).fuse(), o!("version" => env!("CARGO_PKG_VERSION")))
}
