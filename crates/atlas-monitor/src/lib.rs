//! Structured logging for the atlas binaries.

mod logging;

pub use logging::setup_logging;
