use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;

/**
 * Log line layout, see https://docs.rs/slog-term/latest/slog_term/
 */
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub(crate) enum LogFormat {
    /**
     * One line per record, with every key/value pair
     */
    #[default]
    Full,
    /**
     * Records grouped by logger context, easier to read on a terminal
     */
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &str {
        match *self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
        }
    }
}

/**
 * Deserialize the log format from the configuration. Unknown values mean `full`.
 */
pub fn deserialize<'de, D>(deserializer: D) -> Result<LogFormat, D::Error>
where
    D: Deserializer<'de>,
{
    match deserializer.deserialize_str(LogFormatVisitor) {
        Ok(format) => Ok(format),
        Err(_) => Ok(LogFormat::Full),
    }
}

struct LogFormatVisitor;

impl<'de> Visitor<'de> for LogFormatVisitor {
    type Value = LogFormat;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string representing a log format")
    }

    fn visit_str<E>(self, value: &str) -> Result<LogFormat, E>
    where
        E: de::Error,
    {
        match value.to_lowercase().as_str() {
            "full" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            _ => Ok(LogFormat::Full),
        }
    }
}
