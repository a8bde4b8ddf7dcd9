use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Write};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};

/// An error that can be shared between an event and a reporter.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// A single value attached to an [`Event`](crate::Event).
///
/// Values are loosely typed.  The variant only matters when a value is
/// turned into a string for a report, see [`stringify`].
#[derive(Clone)]
pub enum Value {
    /// An absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    I64(i64),
    /// An unsigned integer.
    U64(u64),
    /// A floating point number.
    F64(f64),
    /// A string.
    String(String),
    /// A point in time with a fixed UTC offset.
    Time(DateTime<FixedOffset>),
    /// A native error.
    Error(SharedError),
    /// An object rendered through its `Display` implementation.
    Display(Arc<dyn fmt::Display + Send + Sync>),
    /// An object rendered through its `Debug` implementation.
    Debug(Arc<dyn fmt::Debug + Send + Sync>),
    /// A structured JSON value.
    Json(serde_json::Value),
}

impl Value {
    /// Wraps a native error.
    pub fn error<E>(err: E) -> Value
    where
        E: StdError + Send + Sync + 'static,
    {
        Value::Error(Arc::new(err))
    }

    /// Wraps an object that is rendered with `Display`.
    pub fn display<T>(value: T) -> Value
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Value::Display(Arc::new(value))
    }

    /// Wraps an object that is rendered with `Debug`.
    pub fn debug<T>(value: T) -> Value
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Value::Debug(Arc::new(value))
    }

    /// Returns the contained error if this is a native error.
    pub fn as_error(&self) -> Option<&SharedError> {
        match *self {
            Value::Error(ref err) => Some(err),
            _ => None,
        }
    }

    /// Renders the value into the string that is sent along with a report.
    ///
    /// This never fails: if a wrapped object's formatting implementation
    /// reports an error, whatever was written up to that point is returned.
    pub fn to_report_string(&self) -> String {
        let mut rv = String::new();
        write!(rv, "{}", self).ok();
        rv
    }
}

/// Renders a value into the string sent along with a report.
///
/// Timestamps are written as RFC 3339 with whole seconds (`Z` for UTC),
/// values with a display form use it, and everything else falls back to
/// its debug representation.
pub fn stringify(value: &Value) -> String {
    value.to_report_string()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Null => f.write_str("null"),
            Value::Bool(val) => write!(f, "{}", val),
            Value::I64(val) => write!(f, "{}", val),
            Value::U64(val) => write!(f, "{}", val),
            Value::F64(val) => write!(f, "{}", val),
            Value::String(ref val) => f.write_str(val),
            Value::Time(ref val) => f.write_str(&val.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Value::Error(ref err) => write!(f, "{}", err),
            Value::Display(ref val) => write!(f, "{}", val),
            Value::Debug(ref val) => write!(f, "{:?}", val),
            // strings are written without their JSON quotes
            Value::Json(serde_json::Value::String(ref val)) => f.write_str(val),
            Value::Json(ref val) => write!(f, "{}", val),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Null => f.write_str("Null"),
            Value::Bool(val) => f.debug_tuple("Bool").field(&val).finish(),
            Value::I64(val) => f.debug_tuple("I64").field(&val).finish(),
            Value::U64(val) => f.debug_tuple("U64").field(&val).finish(),
            Value::F64(val) => f.debug_tuple("F64").field(&val).finish(),
            Value::String(ref val) => f.debug_tuple("String").field(val).finish(),
            Value::Time(ref val) => f.debug_tuple("Time").field(val).finish(),
            Value::Error(ref err) => f.debug_tuple("Error").field(err).finish(),
            Value::Display(ref val) => f
                .debug_tuple("Display")
                .field(&format_args!("{}", val))
                .finish(),
            Value::Debug(ref val) => f.debug_tuple("Debug").field(val).finish(),
            Value::Json(ref val) => f.debug_tuple("Json").field(val).finish(),
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $target:ty => $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Value {
                    Value::$variant(val as $target)
                }
            }
        )+
    };
}

impl_from_int!(I64: i64 => i8, i16, i32, i64, isize);
impl_from_int!(U64: u64 => u8, u16, u32, u64, usize);
impl_from_int!(F64: f64 => f32, f64);

impl From<bool> for Value {
    fn from(val: bool) -> Value {
        Value::Bool(val)
    }
}

impl From<char> for Value {
    fn from(val: char) -> Value {
        Value::String(val.to_string())
    }
}

impl<'a> From<&'a str> for Value {
    fn from(val: &'a str) -> Value {
        Value::String(val.to_string())
    }
}

impl From<String> for Value {
    fn from(val: String) -> Value {
        Value::String(val)
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    fn from(val: Cow<'a, str>) -> Value {
        Value::String(val.into_owned())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(val: DateTime<Tz>) -> Value {
        Value::Time(val.fixed_offset())
    }
}

impl From<SystemTime> for Value {
    fn from(val: SystemTime) -> Value {
        Value::from(DateTime::<Utc>::from(val))
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Value {
        match val {
            serde_json::Value::Null => Value::Null,
            val => Value::Json(val),
        }
    }
}

impl From<SharedError> for Value {
    fn from(err: SharedError) -> Value {
        Value::Error(err)
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Value {
    fn from(err: Box<dyn StdError + Send + Sync + 'static>) -> Value {
        Value::Error(Arc::from(err))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(val: Option<T>) -> Value {
        val.map_or(Value::Null, Into::into)
    }
}
