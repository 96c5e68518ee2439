//! Configuration for the Mayil Jira bridge.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Log filter used when `RUST_LOG` is unset or empty.
pub const DEFAULT_LOG_FILTER: &str = "mayil_jira=info";

/// Default seconds before the first status poll.
pub const DEFAULT_INITIAL_POLL_DELAY_SECS: u64 = 600;

/// Default seconds between status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default ceiling on status polls per task.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 10;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Base URL of the Mayil processing service.
    pub server_url: String,
    /// Base URL of the Jira site (e.g., `https://your-domain.atlassian.net`).
    pub jira_base_url: String,
    /// Jira user email for basic auth.
    pub jira_email: Option<String>,
    /// Jira API token for basic auth.
    pub jira_api_token: Option<String>,
    /// Emit JSON logs instead of plain text.
    pub json_logs: bool,
    /// `tracing` filter directives; `RUST_LOG` replaces the default entirely.
    pub log_filter: String,
    /// Polling schedule.
    pub poll: PollPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `SERVER_URL` and `JIRA_BASE_URL` are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            port: lookup("MAYIL_JIRA_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            server_url: required_url(&lookup, "SERVER_URL")?,
            jira_base_url: required_url(&lookup, "JIRA_BASE_URL")?,
            jira_email: lookup("JIRA_EMAIL").filter(|s| !s.is_empty()),
            jira_api_token: lookup("JIRA_API_TOKEN").filter(|s| !s.is_empty()),
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            log_filter: lookup("RUST_LOG")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            poll: PollPolicy::from_lookup(&lookup),
        })
    }
}

fn required_url(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    lookup(name)
        .map(|s| trim_base_url(&s))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}

/// Strip surrounding whitespace and trailing slashes from a configured URL.
#[must_use]
pub fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Delays and attempt ceiling for task status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the first poll after submission.
    pub initial_delay: Duration,
    /// Fixed delay between subsequent polls.
    pub interval: Duration,
    /// Polls stop once a task's attempt counter reaches this value.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_POLL_DELAY_SECS),
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Build a policy from environment overrides, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(&|name: &str| env::var(name).ok())
    }

    /// Build a policy from an arbitrary variable source; unparsable values are ignored.
    #[must_use]
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            initial_delay: lookup("INITIAL_POLL_DELAY_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.initial_delay, Duration::from_secs),
            interval: lookup("POLL_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.interval, Duration::from_secs),
            max_attempts: lookup("MAX_POLL_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
        }
    }
}
