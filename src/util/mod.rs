pub mod logging;

pub use logging::{init_logging, parse_level, LogFormat, LoggingConfig};
