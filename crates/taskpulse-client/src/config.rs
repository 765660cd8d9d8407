//! Client configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use taskpulse_core::{defaults, Error, ExpiryPolicy, Result};

/// Deployment environment selecting the default backend URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            Environment::Development => defaults::DEV_API_URL,
            Environment::Production => defaults::PROD_API_URL,
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!("Unknown TASKPULSE_ENV: {}", other))),
        }
    }
}

/// Configuration shared by the API client, event channel and session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Base URL of the REST backend, without trailing slash.
    pub api_url: String,
    /// WebSocket URL of the event channel.
    pub events_url: String,
    /// REST request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Capacity of the queue between the channel and the notification center.
    pub event_queue_capacity: usize,
    pub expiry: ExpiryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl ClientConfig {
    /// Defaults for the given environment.
    pub fn for_environment(environment: Environment) -> Self {
        let api_url = environment.default_api_url().to_string();
        Self {
            environment,
            events_url: events_url_for(&api_url),
            api_url,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            event_queue_capacity: defaults::EVENT_QUEUE_CAPACITY,
            expiry: ExpiryPolicy::default(),
        }
    }

    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TASKPULSE_ENV` | `development` | Selects the default API URL |
    /// | `TASKPULSE_API_URL` | per environment | REST backend base URL |
    /// | `TASKPULSE_EVENTS_URL` | API URL as `ws(s)://…/events` | Event channel URL |
    /// | `REQUEST_TIMEOUT_SECS` | `30` | REST request timeout |
    /// | `EVENT_QUEUE_CAPACITY` | `256` | Inbound event queue size |
    /// | `NOTIFICATION_EXPIRY_MS` | `5000` | Notification lifetime |
    /// | `NOTIFICATION_CANCEL_ON_READ` | `false` | Reading a notification keeps it |
    ///
    /// A variable that is set but malformed is a [`Error::Config`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = match lookup("TASKPULSE_ENV") {
            Some(value) => Environment::parse(&value)?,
            None => Environment::default(),
        };
        let mut config = Self::for_environment(environment);

        if let Some(url) = lookup("TASKPULSE_API_URL") {
            config = config.with_api_url(url);
        }
        if let Some(url) = lookup("TASKPULSE_EVENTS_URL") {
            config.events_url = url;
        }

        config.request_timeout_secs = parse_var(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            defaults::REQUEST_TIMEOUT_SECS,
        )?;
        config = config.with_event_queue_capacity(parse_var(
            &lookup,
            "EVENT_QUEUE_CAPACITY",
            defaults::EVENT_QUEUE_CAPACITY,
        )?);

        let expiry_ms = parse_var(
            &lookup,
            "NOTIFICATION_EXPIRY_MS",
            defaults::NOTIFICATION_EXPIRY_MS,
        )?;
        let cancel_on_read = match lookup("NOTIFICATION_CANCEL_ON_READ") {
            Some(value) => parse_flag("NOTIFICATION_CANCEL_ON_READ", &value)?,
            None => defaults::NOTIFICATION_CANCEL_ON_READ,
        };

        config.expiry = ExpiryPolicy::default()
            .with_delay(Duration::from_millis(expiry_ms))
            .with_cancel_on_read(cancel_on_read);

        Ok(config)
    }

    /// Set the API URL and derive the events URL from it.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self.events_url = events_url_for(&self.api_url);
        self
    }

    pub fn with_events_url(mut self, url: impl Into<String>) -> Self {
        self.events_url = url.into();
        self
    }

    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity.max(1);
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid {}: {}", name, value))),
        None => Ok(default),
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(Error::Config(format!("Invalid {}: {}", name, value))),
    }
}

/// Map an HTTP(S) API URL onto the WebSocket event endpoint.
fn events_url_for(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}{}", ws, defaults::EVENTS_PATH)
}
