//! Detects the active responsive breakpoint declared through the `--breakpoint`
//! custom property, with a `:before { content }` fallback for hosts that do not
//! support custom properties.

pub mod detect;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod host;
pub mod inject;
pub mod loader;
pub mod parser;
pub mod ready;
pub mod style;

pub use detect::{BreakpointDetector, DetectionMode};
pub use error::{BreakpointError, Result};
