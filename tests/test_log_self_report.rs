#![cfg(feature = "with_log")]

use std::sync::{Arc, Mutex};

use severity_report::integrations::log as report_log;
use severity_report::test::TestReporter;
use severity_report::{fields, Event, Priority, ReportFilter, SELF_REPORT_TARGET};

type Lines = Vec<(log::Level, String, String)>;

#[derive(Default, Clone)]
struct Recorder(Arc<Mutex<Lines>>);

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

#[test]
fn test_handle_logs_failure_once() {
    let reporter = Arc::new(TestReporter::new());
    reporter.fail_with(Some("abc"), "boom");
    let dest = Recorder::default();
    report_log::init(
        Some(Box::new(dest.clone())),
        reporter.clone(),
        report_log::LoggerOptions {
            global_filter: Some(log::LevelFilter::Info),
        },
    )
    .unwrap();

    let filter = ReportFilter::new(reporter.clone());
    assert!(filter.handle(&Event::new(Priority::Error, fields! { "x" => 1 })));

    assert_eq!(reporter.reports().len(), 1);
    assert_eq!(
        dest.0.lock().unwrap().clone(),
        vec![(
            log::Level::Info,
            SELF_REPORT_TARGET.to_string(),
            "err=boom uuid=abc priority=error action=rollbar-report".to_string()
        )]
    );
}
