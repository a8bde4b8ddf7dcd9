//! Sets up `env_logger` with error reporting in front of it.
//!
//! **Feature:** `with_env_logger` (*disabled by default*)
//!
//! In the most trivial version you call this crate's init function instead of the one
//! from `env_logger` and pass `None` as logger:
//!
//! ```no_run
//! use severity_report::test::TestReporter;
//!
//! let reporter = TestReporter::new();
//! severity_report::integrations::env_logger::init(None, reporter, Default::default()).unwrap();
//! ```
//!
//! This parses the default `RUST_LOG` environment variable and configures both `env_logger`
//! and this crate appropriately.
use crate::integrations::log::{self as report_log, LoggerOptions};
use crate::reporter::Reporter;

/// Initializes the environment logger.
///
/// If a logger is given then it is used, otherwise a new logger is created in the same
/// way as `env_logger::init` does normally.  The `global_filter` on the options is set
/// to the filter of the logger unless it was set already.
pub fn init<R>(
    logger: Option<env_logger::Logger>,
    reporter: R,
    mut options: LoggerOptions,
) -> Result<(), log::SetLoggerError>
where
    R: Reporter + 'static,
{
    let logger =
        logger.unwrap_or_else(|| env_logger::Builder::from_env(env_logger::Env::default()).build());
    if options.global_filter.is_none() {
        options.global_filter = Some(logger.filter());
    }
    report_log::init(Some(Box::new(logger)), reporter, options)
}
