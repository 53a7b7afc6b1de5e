//! # Utility Modules
//!
//! Supporting pieces used by the relay and the capture tap.
//!
//! ## Components
//! - **Capture Log**: append-only, delimiter-framed frame log
//! - **Logging**: tracing subscriber setup
//! - **Metrics**: per-unit atomic counters

pub mod capture_log;
pub mod logging;
pub mod metrics;

pub use capture_log::CaptureLog;
pub use metrics::{RelayMetrics, TapMetrics};
