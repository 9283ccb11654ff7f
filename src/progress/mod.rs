//! Progress reporting for sweep operations

mod console;
mod handler;
mod logging;

pub use console::ConsoleHandler;
pub use handler::{MultiHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
