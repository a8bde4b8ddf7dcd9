use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The severity of an [`Event`](crate::Event).
///
/// Priorities are ordered from least to most severe, so
/// `Priority::Info < Priority::Error` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Debugging output.
    Debug,
    /// Informational messages.
    Info,
    /// Normal but significant conditions.
    Notice,
    /// Warning conditions.
    Warning,
    /// Error conditions.
    Error,
    /// Critical conditions.
    Critical,
    /// Action must be taken immediately.
    Alert,
    /// The system is unusable.
    Emergency,
}

/// The lowest priority that is forwarded to a reporter.
pub const REPORT_THRESHOLD: Priority = Priority::Error;

/// The reporting tier an event is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Reported through `Reporter::report_error`.
    Error,
    /// Reported through `Reporter::report_critical`.
    Critical,
}

impl Priority {
    /// Returns the lowercase name of the priority.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Debug => "debug",
            Priority::Info => "info",
            Priority::Notice => "notice",
            Priority::Warning => "warning",
            Priority::Error => "error",
            Priority::Critical => "critical",
            Priority::Alert => "alert",
            Priority::Emergency => "emergency",
        }
    }

    /// Returns `true` if events of this priority are forwarded to a reporter.
    pub fn is_reported(self) -> bool {
        self >= REPORT_THRESHOLD
    }

    /// Maps the priority to the tier it is reported with, if any.
    pub fn report_tier(self) -> Option<Tier> {
        match self {
            Priority::Error => Some(Tier::Error),
            Priority::Critical | Priority::Alert | Priority::Emergency => Some(Tier::Critical),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Info
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a priority name cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown priority `{0}`")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Priority, ParsePriorityError> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Priority::Debug,
            "info" => Priority::Info,
            "notice" => Priority::Notice,
            "warning" | "warn" => Priority::Warning,
            "error" | "err" => Priority::Error,
            "critical" | "crit" => Priority::Critical,
            "alert" => Priority::Alert,
            "emergency" | "emerg" => Priority::Emergency,
            _ => return Err(ParsePriorityError(s.to_string())),
        })
    }
}

impl Tier {
    /// Returns the level name used by reporting services for this tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Error => "error",
            Tier::Critical => "critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[test]
fn test_priority_ordering() {
    assert!(Priority::Debug < Priority::Info);
    assert!(Priority::Warning < REPORT_THRESHOLD);
    assert!(Priority::Emergency > Priority::Alert);
    assert!(!Priority::Warning.is_reported());
    assert!(Priority::Error.is_reported());
    assert!(Priority::Emergency.is_reported());
}

#[test]
fn test_report_tier() {
    assert_eq!(Priority::Notice.report_tier(), None);
    assert_eq!(Priority::Error.report_tier(), Some(Tier::Error));
    assert_eq!(Priority::Critical.report_tier(), Some(Tier::Critical));
    assert_eq!(Priority::Alert.report_tier(), Some(Tier::Critical));
    assert_eq!(Priority::Emergency.report_tier(), Some(Tier::Critical));
}

#[test]
fn test_parse_priority() {
    assert_eq!("error".parse(), Ok(Priority::Error));
    assert_eq!("WARN".parse(), Ok(Priority::Warning));
    assert_eq!(" crit ".parse(), Ok(Priority::Critical));
    assert_eq!(
        "loud".parse::<Priority>(),
        Err(ParsePriorityError("loud".into()))
    );
    assert_eq!(Priority::Critical.to_string(), "critical");
}
