use std::iter::FromIterator;
use std::slice;

use crate::level::Priority;
use crate::value::Value;

/// The key/value data of an [`Event`].
///
/// Fields keep their insertion order.  Code that looks for "the first"
/// matching key (such as the error lookup in [`classify`](crate::classify))
/// therefore behaves the same on every run.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    /// Creates an empty set of fields.
    pub fn new() -> Fields {
        Fields::default()
    }

    /// Appends a field.
    ///
    /// Keys are not deduplicated.
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.entries.push((key.into(), value.into()));
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterates over all fields in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Iterator over the fields of an event.
pub struct Iter<'a> {
    inner: slice::Iter<'a, (String, Value)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Fields {
        let mut rv = Fields::new();
        rv.extend(iter);
        rv
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// A structured log event as seen by a [`ReportFilter`](crate::ReportFilter).
#[derive(Debug, Clone, Default)]
pub struct Event {
    /// The severity of the event.
    pub priority: Priority,
    /// The event's data.
    pub fields: Fields,
}

impl Event {
    /// Creates a new event.
    pub fn new(priority: Priority, fields: Fields) -> Event {
        Event { priority, fields }
    }

    /// Appends a field and returns the event.
    pub fn with<K, V>(mut self, key: K, value: V) -> Event
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key, value);
        self
    }
}

/// Builds [`Fields`] from `key => value` pairs.
///
/// Values go through `Into<Value>`, keys through `Into<String>`.
///
/// # Examples
///
/// ```
/// use severity_report::{fields, Value};
///
/// let fields = fields! {
///     "user" => "jane",
///     "attempt" => 3,
/// };
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields.get("user").unwrap().to_report_string(), "jane");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert($key, $value);
        )+
        fields
    }};
}

#[test]
fn test_fields_keep_insertion_order() {
    let fields = fields! {
        "error" => "oops",
        "b" => 1,
        "err" => "ignored",
        "a" => 2,
    };
    let keys: Vec<_> = fields.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["error", "b", "err", "a"]);
    assert_eq!(fields.get("err").unwrap().to_report_string(), "ignored");
    assert!(fields.get("missing").is_none());
}

#[test]
fn test_event_builder() {
    let event = Event::new(Priority::Error, Fields::new())
        .with("x", 42)
        .with("y", "z");
    assert_eq!(event.priority, Priority::Error);
    assert_eq!(event.fields.len(), 2);
    assert!(!event.fields.is_empty());
}
