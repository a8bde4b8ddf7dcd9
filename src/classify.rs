use std::sync::Arc;

use thiserror::Error;

use crate::event::Fields;
use crate::reporter::Extras;
use crate::value::{SharedError, Value};

/// The keys an event's error is looked up under.
pub const ERROR_KEYS: &[&str] = &["err", "error"];

/// A generic error carrying only a message.
///
/// Created when the value stored under an error key is not a native error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ErrorMessage(pub String);

/// An event's data split into the error and the remaining context.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    /// The event's error, if one was found.
    pub error: Option<SharedError>,
    /// All other fields, stringified.
    pub extras: Extras,
}

fn is_error_key(key: &str) -> bool {
    ERROR_KEYS.contains(&key)
}

fn coerce_error(value: &Value) -> SharedError {
    match value.as_error() {
        Some(err) => err.clone(),
        None => Arc::new(ErrorMessage(value.to_report_string())),
    }
}

/// Splits event data into the error and the stringified extras.
///
/// The first field (in insertion order) keyed `err` or `error` is the
/// error.  Every other field, a later `err`/`error` included, ends up in the
/// extras.  If a key appears more than once among those, the last value
/// wins.
pub fn classify(data: &Fields) -> Classified {
    let mut rv = Classified::default();
    for (key, value) in data {
        if rv.error.is_none() && is_error_key(key) {
            rv.error = Some(coerce_error(value));
        } else {
            rv.extras.insert(key.to_string(), value.to_report_string());
        }
    }
    rv
}
