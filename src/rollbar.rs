//! A [`Reporter`] that sends items to Rollbar.
//!
//! **Feature:** `with_rollbar_transport` (*enabled by default*)
//!
//! Every report is one blocking `POST` to the item endpoint.  Nothing is
//! queued or retried: when the request fails the failure is returned right
//! away, carrying the UUID the item was sent with.
//!
//! ```no_run
//! use severity_report::rollbar::{RollbarOptions, RollbarReporter};
//! use severity_report::{fields, Event, Priority, ReportFilter};
//!
//! let filter = ReportFilter::new(RollbarReporter::new(RollbarOptions::from_env()));
//! filter.handle(&Event::new(Priority::Error, fields! { "err" => "it broke" }));
//! ```
use std::borrow::Cow;
use std::env;
use std::error::Error as StdError;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use reqwest::blocking::Client;
use serde_json::{json, Value as JsonValue};
use url::Url;
use uuid::Uuid;

use crate::level::Tier;
use crate::report_debug;
use crate::reporter::{Extras, ReportError, ReportFailure, ReportResult, Reporter};
use crate::value::SharedError;

lazy_static! {
    static ref DEFAULT_ENDPOINT: Url = "https://api.rollbar.com/api/1/".parse().unwrap();
}

const NOTIFIER_NAME: &str = env!("CARGO_PKG_NAME");
const NOTIFIER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration of a [`RollbarReporter`].
///
/// # Examples
///
/// ```
/// let options = severity_report::rollbar::RollbarOptions {
///     access_token: Some("post_server_item_token".into()),
///     environment: "staging".into(),
///     ..Default::default()
/// };
/// assert_eq!(options.endpoint.as_str(), "https://api.rollbar.com/api/1/");
/// ```
#[derive(Debug, Clone)]
pub struct RollbarOptions {
    /// The `post_server_item` access token.  If not set the reporter is
    /// disabled.
    pub access_token: Option<String>,
    /// The environment sent with every item. (defaults to `production`)
    pub environment: Cow<'static, str>,
    /// The API base URL.
    pub endpoint: Url,
    /// The version of the reporting application.
    pub code_version: Option<String>,
    /// The timeout for a single request. (defaults to 10 seconds)
    pub timeout: Duration,
}

impl Default for RollbarOptions {
    fn default() -> RollbarOptions {
        RollbarOptions {
            access_token: None,
            environment: "production".into(),
            endpoint: DEFAULT_ENDPOINT.clone(),
            code_version: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl RollbarOptions {
    /// Reads the options from the environment.
    ///
    /// `ROLLBAR_ACCESS_TOKEN`, `ROLLBAR_ENVIRONMENT`, `ROLLBAR_ENDPOINT` and
    /// `ROLLBAR_CODE_VERSION` are honored.  Missing or invalid values keep
    /// their defaults.
    pub fn from_env() -> RollbarOptions {
        RollbarOptions::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> RollbarOptions
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut rv = RollbarOptions::default();
        rv.access_token = lookup("ROLLBAR_ACCESS_TOKEN");
        if let Some(environment) = lookup("ROLLBAR_ENVIRONMENT") {
            rv.environment = environment.into();
        }
        if let Some(endpoint) = lookup("ROLLBAR_ENDPOINT") {
            match endpoint.parse::<Url>() {
                Ok(endpoint) => rv.endpoint = endpoint,
                Err(err) => report_debug!("ignoring invalid ROLLBAR_ENDPOINT: {}", err),
            }
        }
        rv.code_version = lookup("ROLLBAR_CODE_VERSION");
        rv
    }
}

/// Sends reports to the Rollbar item API.
pub struct RollbarReporter {
    options: RollbarOptions,
    client: Option<Client>,
}

impl RollbarReporter {
    /// Creates a new reporter.
    pub fn new(options: RollbarOptions) -> RollbarReporter {
        let client = match Client::builder().timeout(options.timeout).build() {
            Ok(client) => Some(client),
            Err(err) => {
                report_debug!("failed to create http client: {}", err);
                None
            }
        };
        RollbarReporter { options, client }
    }

    /// Creates a new reporter that uses the specified `Client`.
    pub fn with_client(options: RollbarOptions, client: Client) -> RollbarReporter {
        RollbarReporter {
            options,
            client: Some(client),
        }
    }

    /// Returns the options of the reporter.
    pub fn options(&self) -> &RollbarOptions {
        &self.options
    }

    /// Returns `true` if reports are actually sent.
    pub fn is_enabled(&self) -> bool {
        self.options.access_token.is_some() && self.client.is_some()
    }

    fn send(&self, tier: Tier, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        let (token, client) = match (&self.options.access_token, &self.client) {
            (Some(token), Some(client)) => (token, client),
            _ => return Err(ReportError::Disabled.into()),
        };
        let url = self
            .options
            .endpoint
            .join("item/")
            .map_err(|err| ReportFailure::new(ReportError::Other(Box::new(err))))?;

        let uuid = Uuid::new_v4().to_string();
        let item = build_item(&self.options, token, &uuid, tier, error, extras, Utc::now());
        report_debug!("sending {} item {} to {}", tier, uuid, url);

        let response = match client.post(url).json(&item).send() {
            Ok(response) => response,
            Err(err) => return Err(ReportFailure::with_uuid(uuid, ReportError::Transport(err))),
        };
        let status = response.status();
        if status.is_success() {
            return Ok(uuid);
        }
        let message = response.json::<JsonValue>().ok().and_then(|body| {
            body.get("message")
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        });
        Err(ReportFailure::with_uuid(
            uuid,
            ReportError::Rejected {
                status: status.as_u16(),
                message,
            },
        ))
    }
}

impl Reporter for RollbarReporter {
    fn report_error(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        self.send(Tier::Error, error, extras)
    }

    fn report_critical(&self, error: Option<&SharedError>, extras: &Extras) -> ReportResult {
        self.send(Tier::Critical, error, extras)
    }
}

fn trace_chain(err: &(dyn StdError + 'static)) -> Vec<JsonValue> {
    let mut rv = Vec::new();
    let mut next = Some(err);
    while let Some(err) = next {
        rv.push(json!({
            "frames": [],
            "exception": {
                "class": "Error",
                "message": err.to_string(),
            },
        }));
        next = err.source();
    }
    rv
}

/// Builds the JSON item for a single report.
///
/// An error is sent as a trace chain following `Error::source`, a report
/// without an error as a message body using the `msg` extra.
fn build_item(
    options: &RollbarOptions,
    token: &str,
    uuid: &str,
    tier: Tier,
    error: Option<&SharedError>,
    extras: &Extras,
    timestamp: DateTime<Utc>,
) -> JsonValue {
    let body = match error {
        Some(err) => json!({ "trace_chain": trace_chain(&**err) }),
        None => json!({
            "message": {
                "body": extras.get("msg").map(String::as_str).unwrap_or("error without details"),
            },
        }),
    };
    let mut data = json!({
        "environment": options.environment,
        "level": tier.as_str(),
        "timestamp": timestamp.timestamp(),
        "uuid": uuid,
        "platform": env::consts::OS,
        "language": "rust",
        "notifier": {
            "name": NOTIFIER_NAME,
            "version": NOTIFIER_VERSION,
        },
        "body": body,
        "custom": extras,
    });
    if let Some(ref code_version) = options.code_version {
        data["code_version"] = code_version.as_str().into();
    }
    json!({
        "access_token": token,
        "data": data,
    })
}
