//! Adapters that plug a [`ReportFilter`](crate::ReportFilter) into a
//! logging pipeline.
//!
//! Which integrations are available depends on the features that were compiled in.

#[cfg(feature = "with_log")]
pub mod log;

#[cfg(feature = "with_env_logger")]
pub mod env_logger;

#[cfg(feature = "with_slog")]
pub mod slog;
