//! Reports errors logged through `slog`.
//!
//! **Feature:** `with_slog` (*enabled by default*) + `with_slog_nested` (optional)
//!
//! The [`ReportDrain`] wraps another drain.  Error and critical records are
//! shown to a [`ReportFilter`] and every record is passed on to the wrapped
//! drain.
//!
//! ```
//! use severity_report::integrations::slog::wrap_drain;
//! use severity_report::test::TestReporter;
//! use std::sync::Arc;
//!
//! let reporter = Arc::new(TestReporter::new());
//! let drain = wrap_drain(slog::Discard, reporter.clone());
//! let root = slog::Logger::root(drain, slog::o!("worker" => "worker1"));
//!
//! slog::warn!(root, "not reported");
//! slog::crit!(root, "reported"; "err" => "out of disk");
//!
//! let reports = reporter.reports();
//! assert_eq!(reports.len(), 1);
//! assert_eq!(reports[0].error_message().as_deref(), Some("out of disk"));
//! assert_eq!(reports[0].extras["worker"], "worker1");
//! ```
use std::fmt;
use std::sync::Arc;

use slog::{Drain, OwnedKVList, Record, Serializer, KV};
use thiserror::Error;

use crate::event::{Event, Fields};
use crate::filter::{ReportFilter, SELF_REPORT_TARGET};
use crate::level::Priority;
use crate::reporter::Reporter;
use crate::value::Value;

// Owned copy of an error and its causes.
#[derive(Debug, Error)]
#[error("{message}")]
struct CapturedError {
    message: String,
    #[source]
    source: Option<Box<CapturedError>>,
}

impl CapturedError {
    fn new(error: &(dyn std::error::Error + 'static)) -> CapturedError {
        CapturedError {
            message: error.to_string(),
            source: error
                .source()
                .map(|source| Box::new(CapturedError::new(source))),
        }
    }
}

// Serializer which stores slog values as event fields.
//
// slog serializes key/values last written first.
#[derive(Default)]
struct FieldCollector {
    entries: Vec<(String, Value)>,
}

impl FieldCollector {
    fn push<V: Into<Value>>(&mut self, key: slog::Key, val: V) -> slog::Result {
        self.entries.push((key.to_string(), val.into()));
        Ok(())
    }

    fn extend_in_written_order(self, fields: &mut Fields) {
        fields.extend(self.entries.into_iter().rev());
    }
}

macro_rules! impl_emit {
    ($($function_name:ident: $type:ty),+) => {
        $(
            fn $function_name(&mut self, key: slog::Key, val: $type) -> slog::Result {
                self.push(key, val)
            }
        )+
    };
}

impl Serializer for FieldCollector {
    impl_emit!(
        emit_bool: bool,
        emit_char: char,
        emit_str: &str,
        emit_u8: u8,
        emit_i8: i8,
        emit_u16: u16,
        emit_i16: i16,
        emit_u32: u32,
        emit_i32: i32,
        emit_u64: u64,
        emit_i64: i64,
        emit_usize: usize,
        emit_isize: isize,
        emit_f32: f32,
        emit_f64: f64
    );

    fn emit_unit(&mut self, key: slog::Key) -> slog::Result {
        self.push(key, Value::Null)
    }

    fn emit_none(&mut self, key: slog::Key) -> slog::Result {
        self.push(key, Value::Null)
    }

    fn emit_arguments(&mut self, key: slog::Key, val: &fmt::Arguments<'_>) -> slog::Result {
        self.push(key, val.to_string())
    }

    fn emit_error(
        &mut self,
        key: slog::Key,
        error: &(dyn std::error::Error + 'static),
    ) -> slog::Result {
        self.push(key, Value::Error(Arc::new(CapturedError::new(error))))
    }

    #[cfg(feature = "with_slog_nested")]
    fn emit_serde(&mut self, key: slog::Key, value: &dyn slog::SerdeValue) -> slog::Result {
        let value = serde_json::to_value(value.as_serde()).unwrap_or(serde_json::Value::Null);
        self.push(key, value)
    }
}

/// Converts a `slog::Level` to a `Priority`.
pub fn convert_log_level(level: slog::Level) -> Priority {
    match level {
        slog::Level::Trace | slog::Level::Debug => Priority::Debug,
        slog::Level::Info => Priority::Info,
        slog::Level::Warning => Priority::Warning,
        slog::Level::Error => Priority::Error,
        slog::Level::Critical => Priority::Critical,
    }
}

/// Creates an event from a `slog::Record` and the logger's values.
///
/// The message is stored as `msg`, followed by the logger's key/values and
/// then the record's key/values, each in the order
/// they were written.  A record value therefore overrides logger context
/// with the same key.
pub fn event_from_record(record: &Record<'_>, values: &OwnedKVList) -> Event {
    let mut fields = Fields::new();
    fields.insert("msg", record.msg().to_string());

    // slog::KV can be only serialized, so a Serializer collects the values
    let mut logger_kv = FieldCollector::default();
    values.serialize(record, &mut logger_kv).ok();
    logger_kv.extend_in_written_order(&mut fields);

    let mut record_kv = FieldCollector::default();
    record.kv().serialize(record, &mut record_kv).ok();
    record_kv.extend_in_written_order(&mut fields);

    Event::new(convert_log_level(record.level()), fields)
}

/// A drain which reports error records and passes everything on.
pub struct ReportDrain<D, R> {
    drain: D,
    filter: ReportFilter<R>,
}

impl<D: Drain, R: Reporter> ReportDrain<D, R> {
    /// Creates a new `ReportDrain`, wrapping a `slog::Drain`.
    pub fn new(drain: D, reporter: R) -> Self {
        Self {
            drain,
            filter: ReportFilter::new(reporter),
        }
    }

    /// Returns the report filter.
    pub fn filter(&self) -> &ReportFilter<R> {
        &self.filter
    }

    fn write_self_report(&self, event: &Event, values: &OwnedKVList) {
        let field = |key| {
            event
                .fields
                .get(key)
                .map(Value::to_report_string)
                .unwrap_or_default()
        };
        let (err, uuid, priority, action) =
            (field("err"), field("uuid"), field("priority"), field("action"));
        self.drain
            .log(
                &slog::record!(
                    slog::Level::Info,
                    SELF_REPORT_TARGET,
                    &format_args!("failed to report event"),
                    slog::b!(
                        "err" => err,
                        "uuid" => uuid,
                        "priority" => priority,
                        "action" => action
                    )
                ),
                values,
            )
            .ok();
    }
}

impl<D: Drain, R: Reporter> Drain for ReportDrain<D, R> {
    type Ok = D::Ok;
    type Err = D::Err;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        if record.level().is_at_least(slog::Level::Error) && record.tag() != SELF_REPORT_TARGET {
            let event = event_from_record(record, values);
            self.filter.handle_with(&event, &|event: Event| {
                self.write_self_report(&event, values)
            });
        }
        self.drain.log(record, values)
    }

    fn is_enabled(&self, level: slog::Level) -> bool {
        level.is_at_least(slog::Level::Error) || self.drain.is_enabled(level)
    }
}

impl<D, R> std::ops::Deref for ReportDrain<D, R> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        &self.drain
    }
}

/// Wraps a `slog::Drain`.
pub fn wrap_drain<D, R>(drain: D, reporter: R) -> ReportDrain<D, R>
where
    D: Drain,
    R: Reporter,
{
    ReportDrain::new(drain, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::format_fields;
    use crate::level::Tier;
    use crate::test::TestReporter;
    use std::sync::Mutex;

    type Lines = Vec<(slog::Level, String, String)>;

    // Drain recording level, message and key/values of every record.
    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Lines>>);

    impl Recorder {
        fn lines(&self) -> Lines {
            self.0.lock().unwrap().clone()
        }
    }

    impl Drain for Recorder {
        type Ok = ();
        type Err = slog::Never;

        fn log(&self, record: &Record<'_>, _: &OwnedKVList) -> Result<(), slog::Never> {
            let mut collector = FieldCollector::default();
            record.kv().serialize(record, &mut collector).ok();
            let mut fields = Fields::new();
            collector.extend_in_written_order(&mut fields);
            self.0.lock().unwrap().push((
                record.level(),
                record.msg().to_string(),
                format_fields(&fields),
            ));
            Ok(())
        }
    }

    #[test]
    fn test_levels() {
        let reporter = Arc::new(TestReporter::new());
        let recorder = Recorder::default();
        let root = slog::Logger::root(
            wrap_drain(recorder.clone(), reporter.clone()),
            slog::o!(),
        );

        slog::info!(root, "info");
        slog::warn!(root, "warning");
        slog::error!(root, "error");
        slog::crit!(root, "critical");

        let tiers: Vec<_> = reporter.reports().into_iter().map(|r| r.tier).collect();
        assert_eq!(tiers, vec![Tier::Error, Tier::Critical]);
        assert_eq!(recorder.lines().len(), 4);
    }

    #[test]
    fn test_fields() {
        let reporter = Arc::new(TestReporter::new());
        let root = slog::Logger::root(
            wrap_drain(slog::Discard, reporter.clone()),
            slog::o!("worker" => "worker1"),
        );

        slog::error!(root, "request failed"; "error" => "timeout", "status" => 504u16, "retry" => false);

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].error_message().as_deref(), Some("timeout"));
        let extras: Vec<_> = reports[0]
            .extras
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            extras,
            vec![
                ("msg", "request failed"),
                ("retry", "false"),
                ("status", "504"),
                ("worker", "worker1"),
            ]
        );
    }

    #[test]
    fn test_first_written_error_key_wins() {
        let reporter = Arc::new(TestReporter::new());
        let root = slog::Logger::root(wrap_drain(slog::Discard, reporter.clone()), slog::o!());

        slog::error!(root, "m"; "err" => "first", "error" => "second");

        let reports = reporter.reports();
        assert_eq!(reports[0].error_message().as_deref(), Some("first"));
        assert_eq!(reports[0].extras["error"], "second");
    }

    #[test]
    fn test_record_values_override_logger_values() {
        let reporter = Arc::new(TestReporter::new());
        let root = slog::Logger::root(
            wrap_drain(slog::Discard, reporter.clone()),
            slog::o!("user" => "a", "region" => "eu"),
        );

        slog::error!(root, "m"; "user" => "b");

        let report = &reporter.reports()[0];
        assert_eq!(report.extras["user"], "b");
        assert_eq!(report.extras["region"], "eu");
    }

    #[test]
    fn test_event_keeps_written_order() {
        let reporter = Arc::new(TestReporter::new());
        let recorder = Recorder::default();
        let root = slog::Logger::root(
            wrap_drain(recorder.clone(), reporter.clone()),
            slog::o!("worker" => "w1", "pool" => "p1"),
        );

        slog::error!(root, "m"; "a" => 1, "b" => 2);

        assert_eq!(recorder.lines()[0].2, "a=1 b=2");
    }

    #[test]
    fn test_error_source_chain_is_kept() {
        #[derive(Debug, Error)]
        #[error("request failed")]
        struct RequestError(#[source] std::io::Error);

        let reporter = Arc::new(TestReporter::new());
        let root = slog::Logger::root(wrap_drain(slog::Discard, reporter.clone()), slog::o!());

        let err = RequestError(std::io::Error::new(
            std::io::ErrorKind::Other,
            "connection reset",
        ));
        slog::error!(root, "m"; "err" => #err);

        let report = &reporter.reports()[0];
        let error = report.error.as_ref().unwrap();
        let mut chain = vec![error.to_string()];
        let mut next = error.source();
        while let Some(cause) = next {
            chain.push(cause.to_string());
            next = cause.source();
        }
        assert_eq!(chain, vec!["request failed", "connection reset"]);
    }

    #[test]
    fn test_failure_goes_to_wrapped_drain() {
        let reporter = Arc::new(TestReporter::new());
        reporter.fail_with(Some("abc"), "boom");
        let recorder = Recorder::default();
        let root = slog::Logger::root(
            wrap_drain(recorder.clone(), reporter.clone()),
            slog::o!(),
        );

        slog::error!(root, "disk full");

        let lines = recorder.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, slog::Level::Info);
        assert_eq!(lines[0].1, "failed to report event");
        assert_eq!(
            lines[0].2,
            "err=boom uuid=abc priority=error action=rollbar-report"
        );
        assert_eq!(lines[1].0, slog::Level::Error);
        assert_eq!(lines[1].1, "disk full");
        assert_eq!(reporter.reports().len(), 1);
    }

    #[test]
    fn test_is_enabled() {
        struct Quiet;

        impl Drain for Quiet {
            type Ok = ();
            type Err = slog::Never;

            fn log(&self, _: &Record<'_>, _: &OwnedKVList) -> Result<(), slog::Never> {
                Ok(())
            }

            fn is_enabled(&self, _: slog::Level) -> bool {
                false
            }
        }

        let drain = wrap_drain(Quiet, TestReporter::new());
        assert!(drain.is_enabled(slog::Level::Critical));
        assert!(drain.is_enabled(slog::Level::Error));
        assert!(!drain.is_enabled(slog::Level::Warning));
    }
}
