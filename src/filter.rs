use std::sync::Arc;

use crate::classify::classify;
use crate::event::{Event, Fields};
use crate::level::{Priority, Tier};
use crate::reporter::{ReportFailure, Reporter};
use crate::value::{SharedError, Value};

/// The log target self-reports are written to by [`LogSelfReport`].
pub const SELF_REPORT_TARGET: &str = "severity_report::self_report";

/// The value of the `action` field on self-reports.
pub const REPORT_ACTION: &str = "rollbar-report";

/// Something that decides whether an event continues down a pipeline.
pub trait Filter: Send + Sync {
    /// Inspects the event and returns `true` if it should continue.
    fn filter(&self, event: &Event) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn filter(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Receives the events a [`ReportFilter`] logs about failed reports.
///
/// Self-reports are always below the report threshold.  Host adapters
/// hand them straight to their downstream handler so they never pass
/// through the filter that created them.
pub trait SelfReport {
    /// Emits a self-report event.
    fn self_report(&self, event: Event);
}

impl<F: Fn(Event)> SelfReport for F {
    fn self_report(&self, event: Event) {
        self(event)
    }
}

/// Writes self-reports through the `log` facade.
///
/// Records are logged at `Info` level under [`SELF_REPORT_TARGET`] with
/// the fields rendered as `key=value` pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSelfReport;

impl SelfReport for LogSelfReport {
    fn self_report(&self, event: Event) {
        log::info!(target: SELF_REPORT_TARGET, "{}", format_fields(&event.fields));
    }
}

/// Renders fields as space separated `key=value` pairs.
pub(crate) fn format_fields(fields: &Fields) -> String {
    let mut rv = String::new();
    for (key, value) in fields {
        if !rv.is_empty() {
            rv.push(' ');
        }
        rv.push_str(key);
        rv.push('=');
        rv.push_str(&value.to_report_string());
    }
    rv
}

/// Forwards error level events to a [`Reporter`].
///
/// Events below [`REPORT_THRESHOLD`](crate::REPORT_THRESHOLD) are ignored.
/// Error events go to `report_error`, critical, alert and emergency events
/// go to `report_critical`.  The filter never stops an event: every call
/// returns `true`.
///
/// # Examples
///
/// ```
/// use severity_report::test::TestReporter;
/// use severity_report::{fields, Event, Priority, ReportFilter};
///
/// let reporter = TestReporter::new();
/// let filter = ReportFilter::new(&reporter);
///
/// let event = Event::new(Priority::Error, fields! { "error" => "oops" });
/// assert!(filter.handle(&event));
/// assert_eq!(reporter.reports().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ReportFilter<R> {
    reporter: R,
}

impl<R: Reporter> ReportFilter<R> {
    /// Creates a filter reporting to `reporter`.
    pub fn new(reporter: R) -> ReportFilter<R> {
        ReportFilter { reporter }
    }

    /// Returns the reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Handles an event, logging report failures through [`LogSelfReport`].
    pub fn handle(&self, event: &Event) -> bool {
        self.handle_with(event, &LogSelfReport)
    }

    /// Handles an event, passing report failures to `sink`.
    ///
    /// At most one self-report is emitted per call.
    pub fn handle_with(&self, event: &Event, sink: &dyn SelfReport) -> bool {
        if !event.priority.is_reported() {
            return true;
        }

        let classified = classify(&event.fields);
        let error = classified.error.as_ref();
        let result = match event.priority.report_tier() {
            Some(Tier::Error) => self.reporter.report_error(error, &classified.extras),
            Some(Tier::Critical) => self.reporter.report_critical(error, &classified.extras),
            None => return true,
        };

        match result {
            Ok(uuid) => {
                crate::report_debug!("reported {} event as {}", event.priority, uuid);
            }
            Err(failure) => sink.self_report(failure_event(event.priority, failure)),
        }
        true
    }
}

impl<R: Reporter> Filter for ReportFilter<R> {
    fn filter(&self, event: &Event) -> bool {
        self.handle(event)
    }
}

fn failure_event(priority: Priority, failure: ReportFailure) -> Event {
    let uuid = failure.uuid.clone().unwrap_or_default();
    let err: SharedError = Arc::new(failure);
    Event::new(Priority::Info, Fields::new())
        .with("err", Value::Error(err))
        .with("uuid", uuid)
        .with("priority", priority.as_str())
        .with("action", REPORT_ACTION)
}
