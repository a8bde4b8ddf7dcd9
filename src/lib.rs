//! This crate forwards error level log events to an error reporting service.
//!
//! A [`ReportFilter`] looks at every [`Event`] of a logging pipeline.  Events
//! at [`Priority::Error`] or above are reported through a [`Reporter`]:
//! error events with `report_error`, critical, alert and emergency events
//! with `report_critical`.  The filter never swallows events, so whatever
//! comes after it in the pipeline still sees everything.
//!
//! # Errors and extras
//!
//! The first field keyed `err` or `error` is the reported error.  A native
//! error ([`Value::Error`]) is passed on as is, any other value is turned
//! into an [`ErrorMessage`] with the stringified value.  All remaining
//! fields are stringified into the report's extras, see [`stringify`] for
//! the rules.
//!
//! ```
//! use severity_report::test::TestReporter;
//! use severity_report::{fields, Event, Priority, Tier};
//!
//! let reporter = TestReporter::new();
//! let filter = severity_report::new(&reporter);
//!
//! let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
//! filter.handle(&Event::new(
//!     Priority::Critical,
//!     fields! { "err" => severity_report::Value::error(io), "x" => 42 },
//! ));
//!
//! let report = &reporter.reports()[0];
//! assert_eq!(report.tier, Tier::Critical);
//! assert_eq!(report.error_message().as_deref(), Some("boom"));
//! assert_eq!(report.extras["x"], "42");
//! ```
//!
//! # Failed reports
//!
//! When the reporter fails, the filter logs a single event at
//! [`Priority::Info`] with the fields `err`, `uuid`, `priority` and
//! `action`.  That event never goes back through the filter, so a broken
//! reporter cannot cause a reporting loop.
//!
//! # Integrations
//!
//! Adapters for the `log` and `slog` crates are available in
//! [`integrations`], and a Rollbar backend in `rollbar`.
#![warn(missing_docs)]
#![deny(unsafe_code)]

mod macros;

mod classify;
mod event;
mod filter;
mod level;
mod reporter;
mod value;

pub mod integrations;
#[cfg(feature = "with_rollbar_transport")]
pub mod rollbar;

pub use crate::classify::{classify, Classified, ErrorMessage, ERROR_KEYS};
pub use crate::event::{Event, Fields, Iter};
pub use crate::filter::{
    Filter, LogSelfReport, ReportFilter, SelfReport, REPORT_ACTION, SELF_REPORT_TARGET,
};
pub use crate::level::{ParsePriorityError, Priority, Tier, REPORT_THRESHOLD};
pub use crate::reporter::{Extras, ReportError, ReportFailure, ReportResult, Reporter};
pub use crate::value::{stringify, SharedError, Value};

/// Creates a [`ReportFilter`] reporting to `reporter`.
pub fn new<R: Reporter>(reporter: R) -> ReportFilter<R> {
    ReportFilter::new(reporter)
}
