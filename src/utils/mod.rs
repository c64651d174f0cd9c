//! Browser glue and display helpers.
//!
//! Provides:
//! - [`BrowserTransport`], [`BrowserAuthFlow`] - `window.fetch` transport with timeout
//! - [`init_logging`] - `tracing` subscriber writing to the console
//! - [`dom`] - Hash navigation, file download/upload and clipboard
//! - [`format`] - File sizes and server timestamps

pub mod dom;
pub mod fetch;
pub mod format;
pub mod logging;

pub use fetch::{BrowserAuthFlow, BrowserTransport, RaceResult, race_with_timeout};
pub use format::{current_timestamp, format_changed, format_size};
pub use logging::init_logging;
