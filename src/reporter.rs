use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::value::SharedError;

/// The stringified context sent along with a report.
pub type Extras = BTreeMap<String, String>;

/// The outcome of a single report.
///
/// On success this carries the identifier the backend assigned to the
/// report.
pub type ReportResult = Result<String, ReportFailure>;

/// Reasons a backend could not take a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The backend has no credentials and drops everything.
    #[error("reporter is disabled")]
    Disabled,
    /// The request never got a response.
    #[cfg(feature = "with_rollbar_transport")]
    #[error("failed to send report")]
    Transport(#[source] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("report rejected with status {status}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The message returned by the backend, if any.
        message: Option<String>,
    },
    /// Any other backend specific failure.
    #[error("{0}")]
    Other(Box<dyn StdError + Send + Sync + 'static>),
}

/// A failed report.
///
/// Backends may already have assigned an identifier before the failure
/// happened, in which case it is kept in `uuid`.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ReportFailure {
    /// The identifier of the failed report, if one was assigned.
    pub uuid: Option<String>,
    /// What went wrong.
    #[source]
    pub error: ReportError,
}

impl ReportFailure {
    /// Creates a failure without an identifier.
    pub fn new(error: ReportError) -> ReportFailure {
        ReportFailure { uuid: None, error }
    }

    /// Creates a failure for a report that was assigned `uuid`.
    pub fn with_uuid<S: Into<String>>(uuid: S, error: ReportError) -> ReportFailure {
        ReportFailure {
            uuid: Some(uuid.into()),
            error,
        }
    }
}

impl From<ReportError> for ReportFailure {
    fn from(error: ReportError) -> ReportFailure {
        ReportFailure::new(error)
    }
}

/// A backend that receives error reports.
///
/// Implementations are shared across threads and must not rely on being
/// called in any particular order.
pub trait Reporter: Send + Sync {
    /// Reports an error level event.
    fn report_error(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult;

    /// Reports a critical, alert or emergency level event.
    fn report_critical(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult;
}

impl<'a, R: Reporter + ?Sized> Reporter for &'a R {
    fn report_error(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        (**self).report_error(error, extras)
    }

    fn report_critical(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        (**self).report_critical(error, extras)
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report_error(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        (**self).report_error(error, extras)
    }

    fn report_critical(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        (**self).report_critical(error, extras)
    }
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report_error(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        (**self).report_error(error, extras)
    }

    fn report_critical(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        (**self).report_critical(error, extras)
    }
}
