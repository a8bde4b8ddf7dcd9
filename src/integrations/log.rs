//! Reports errors logged through the `log` crate.
//!
//! **Feature:** `with_log` (*enabled by default*)
//!
//! The [`Logger`] sits in front of another logger.  Every record is turned
//! into an [`Event`] and shown to a [`ReportFilter`], then forwarded to the
//! destination logger unchanged.
//!
//! ```no_run
//! use severity_report::integrations::log as report_log;
//! use severity_report::test::TestReporter;
//!
//! report_log::init(None, TestReporter::new(), Default::default()).unwrap();
//! log::error!("Shit's on fire yo");
//! ```
use crate::event::{Event, Fields};
use crate::filter::{format_fields, ReportFilter, SELF_REPORT_TARGET};
use crate::level::Priority;
use crate::reporter::Reporter;

/// Logger specific options.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerOptions {
    /// The global filter that should be used (also used before dispatching
    /// to the nested logger).
    pub global_filter: Option<log::LevelFilter>,
}

impl LoggerOptions {
    /// Returns the level that is set globally on `init`.
    ///
    /// Error records are always let through so they can be reported.
    pub(crate) fn effective_global_filter(&self) -> log::LevelFilter {
        match self.global_filter {
            Some(filter) => std::cmp::max(filter, log::LevelFilter::Error),
            None => log::LevelFilter::Trace,
        }
    }
}

/// Provides a reporting logger.
pub struct Logger<R> {
    dest: Option<Box<dyn log::Log>>,
    filter: ReportFilter<R>,
    options: LoggerOptions,
}

impl<R: Reporter> Logger<R> {
    /// Creates a new logger reporting to `reporter`.
    ///
    /// Records are additionally sent to `dest` if given.
    pub fn new(dest: Option<Box<dyn log::Log>>, reporter: R, options: LoggerOptions) -> Logger<R> {
        Logger {
            dest,
            filter: ReportFilter::new(reporter),
            options,
        }
    }

    /// Returns the options of the logger.
    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }

    /// Returns the destination logger.
    pub fn dest_log(&self) -> Option<&dyn log::Log> {
        self.dest.as_deref()
    }

    /// Returns the report filter.
    pub fn filter(&self) -> &ReportFilter<R> {
        &self.filter
    }

    fn forward(&self, record: &log::Record<'_>) {
        if let Some(ref log) = self.dest {
            if log.enabled(record.metadata()) {
                log.log(record);
            }
        }
    }

    fn write_self_report(&self, event: Event) {
        let line = format_fields(&event.fields);
        self.forward(
            &log::Record::builder()
                .level(log::Level::Info)
                .target(SELF_REPORT_TARGET)
                .args(format_args!("{}", line))
                .build(),
        );
    }
}

/// Converts a `log::Level` to a `Priority`.
pub fn convert_log_level(level: log::Level) -> Priority {
    match level {
        log::Level::Error => Priority::Error,
        log::Level::Warn => Priority::Warning,
        log::Level::Info => Priority::Info,
        log::Level::Debug | log::Level::Trace => Priority::Debug,
    }
}

/// Creates an event from a given log record.
///
/// The formatted message is stored as `msg`, the record's target as
/// `target`.
pub fn event_from_record(record: &log::Record<'_>) -> Event {
    let mut fields = Fields::new();
    fields.insert("msg", record.args().to_string());
    fields.insert("target", record.target());
    Event::new(convert_log_level(record.level()), fields)
}

impl<R: Reporter> log::Log for Logger<R> {
    fn enabled(&self, md: &log::Metadata<'_>) -> bool {
        if let Some(global_filter) = self.options.global_filter {
            if md.level() > global_filter {
                return false;
            }
        }
        md.level() <= log::Level::Error || self.dest.as_ref().map_or(false, |x| x.enabled(md))
    }

    fn log(&self, record: &log::Record<'_>) {
        if record.target() != SELF_REPORT_TARGET && record.level() <= log::Level::Error {
            let event = event_from_record(record);
            self.filter
                .handle_with(&event, &|event: Event| self.write_self_report(event));
        }
        self.forward(record);
    }

    fn flush(&self) {
        if let Some(ref log) = self.dest {
            log.flush();
        }
    }
}

/// Installs a reporting logger globally.
///
/// This takes a destination logger to which all records are forwarded.
/// Typically a log system in Rust will call `log::set_logger` itself
/// but since the records need to be intercepted, the destination logger
/// has to be built and passed here instead.
pub fn init<R>(
    dest: Option<Box<dyn log::Log>>,
    reporter: R,
    options: LoggerOptions,
) -> Result<(), log::SetLoggerError>
where
    R: Reporter + 'static,
{
    let logger = Logger::new(dest, reporter, options);
    let filter = logger.options().effective_global_filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestReporter;
    use log::Log;
    use std::sync::{Arc, Mutex};

    type Lines = Vec<(log::Level, String, String)>;

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Lines>>);

    impl Recorder {
        fn lines(&self) -> Lines {
            self.0.lock().unwrap().clone()
        }
    }

    impl log::Log for Recorder {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            self.0.lock().unwrap().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }

        fn flush(&self) {}
    }

    fn record(level: log::Level, msg: &str, f: impl FnOnce(&log::Record<'_>)) {
        f(&log::Record::builder()
            .level(level)
            .target("app")
            .args(format_args!("{}", msg))
            .build());
    }

    #[test]
    fn test_error_records_are_reported_and_forwarded() {
        let reporter = Arc::new(TestReporter::new());
        let dest = Recorder::default();
        let logger = Logger::new(
            Some(Box::new(dest.clone())),
            reporter.clone(),
            Default::default(),
        );

        record(log::Level::Info, "hello", |r| logger.log(r));
        record(log::Level::Error, "disk full", |r| logger.log(r));

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].error.is_none());
        assert_eq!(reports[0].extras["msg"], "disk full");
        assert_eq!(reports[0].extras["target"], "app");
        assert_eq!(dest.lines().len(), 2);
    }

    #[test]
    fn test_failure_goes_to_dest() {
        let reporter = Arc::new(TestReporter::new());
        reporter.fail_with(Some("abc"), "boom");
        let dest = Recorder::default();
        let logger = Logger::new(
            Some(Box::new(dest.clone())),
            reporter.clone(),
            Default::default(),
        );

        record(log::Level::Error, "disk full", |r| logger.log(r));

        let lines = dest.lines();
        assert_eq!(
            lines,
            vec![
                (
                    log::Level::Info,
                    SELF_REPORT_TARGET.to_string(),
                    "err=boom uuid=abc priority=error action=rollbar-report".to_string()
                ),
                (log::Level::Error, "app".to_string(), "disk full".to_string()),
            ]
        );
        assert_eq!(reporter.reports().len(), 1);
    }

    #[test]
    fn test_effective_global_filter() {
        let options = LoggerOptions {
            global_filter: Some(log::LevelFilter::Off),
        };
        assert_eq!(options.effective_global_filter(), log::LevelFilter::Error);
        let options = LoggerOptions {
            global_filter: Some(log::LevelFilter::Debug),
        };
        assert_eq!(options.effective_global_filter(), log::LevelFilter::Debug);
        assert_eq!(
            LoggerOptions::default().effective_global_filter(),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_enabled() {
        let logger = Logger::new(None, TestReporter::new(), Default::default());
        let md = |level| log::Metadata::builder().level(level).build();
        assert!(logger.enabled(&md(log::Level::Error)));
        assert!(!logger.enabled(&md(log::Level::Warn)));
    }
}
