//! Structured logging setup for expsweep
//!
//! Logs go to stderr so they never mix with the per-directory progress lines
//! on stdout.
//!
//! ```no_run
//! use expsweep::util::{init_logging, LoggingConfig};
//!
//! let config = LoggingConfig::resolve(None, true, false, "info").unwrap();
//! init_logging(&config);
//! tracing::debug!(root = "experiments", "Starting sweep");
//! ```

use std::env;
use std::io;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const VALID_LEVELS: &str = "trace, debug, info, warn, error";

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    /// One JSON object per line, for log shippers
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    /// Picks the level from, in order: an explicit `--log-level`, `-v`
    /// (debug), `-q` (error), then the configured level.
    ///
    /// ```
    /// use expsweep::util::LoggingConfig;
    /// use tracing::Level;
    ///
    /// let config = LoggingConfig::resolve(None, false, true, "debug").unwrap();
    /// assert_eq!(config.level, Level::ERROR);
    /// ```
    pub fn resolve(
        explicit: Option<&str>,
        verbose: bool,
        quiet: bool,
        configured: &str,
    ) -> Result<Self, String> {
        let level = match explicit {
            Some(name) => parse_level(name).ok_or_else(|| invalid_level(name))?,
            None if verbose => Level::DEBUG,
            None if quiet => Level::ERROR,
            None => parse_level(configured).ok_or_else(|| invalid_level(configured))?,
        };

        Ok(Self {
            level,
            ..Default::default()
        })
    }

    pub fn json(mut self, enabled: bool) -> Self {
        self.format = if enabled {
            LogFormat::Json
        } else {
            LogFormat::Plain
        };
        self
    }

    /// Filter directives used when `RUST_LOG` is not set: dependencies stay
    /// at `warn`, this crate logs at the chosen level.
    pub fn directives(&self) -> String {
        format!(
            "warn,{}={}",
            env!("CARGO_CRATE_NAME"),
            self.level.as_str().to_lowercase()
        )
    }
}

/// Case-insensitive level name, `None` if unknown
///
/// ```
/// use expsweep::util::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("WARN"), Some(Level::WARN));
/// assert_eq!(parse_level("chatty"), None);
/// ```
pub fn parse_level(name: &str) -> Option<Level> {
    name.trim().parse().ok()
}

fn invalid_level(name: &str) -> String {
    format!("Invalid log level '{}'. Valid levels: {}", name, VALID_LEVELS)
}

/// Installs the global subscriber. Only the first call has an effect.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = match env::var("RUST_LOG") {
            Ok(_) => EnvFilter::from_default_env(),
            Err(_) => EnvFilter::new(config.directives()),
        };
        let registry = tracing_subscriber::registry().with(filter);

        match config.format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .init(),
            LogFormat::Plain => registry
                .with(fmt::layer().with_writer(io::stderr).with_target(false))
                .init(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("Debug"), Some(Level::DEBUG));
        assert_eq!(parse_level(" info "), Some(Level::INFO));
        assert_eq!(parse_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_level("loud"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_explicit_level_wins() {
        let config = LoggingConfig::resolve(Some("trace"), false, true, "warn").unwrap();
        assert_eq!(config.level, Level::TRACE);
    }

    #[test]
    fn test_verbose_then_quiet_then_configured() {
        assert_eq!(
            LoggingConfig::resolve(None, true, false, "warn").unwrap().level,
            Level::DEBUG
        );
        assert_eq!(
            LoggingConfig::resolve(None, false, true, "warn").unwrap().level,
            Level::ERROR
        );
        assert_eq!(
            LoggingConfig::resolve(None, false, false, "warn").unwrap().level,
            Level::WARN
        );
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let err = LoggingConfig::resolve(Some("chatty"), false, false, "info").unwrap_err();
        assert!(err.contains("chatty"));
        assert!(LoggingConfig::resolve(None, false, false, "loud").is_err());
    }

    #[test]
    fn test_directives_scope_crate() {
        let config = LoggingConfig::resolve(None, true, false, "info").unwrap();
        assert_eq!(config.directives(), "warn,expsweep=debug");
    }

    #[test]
    fn test_json_toggle() {
        assert_eq!(LoggingConfig::default().format, LogFormat::Plain);
        assert_eq!(LoggingConfig::default().json(true).format, LogFormat::Json);
    }
}
