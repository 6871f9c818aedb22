//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GCP_PROJECT_NAME` - GCP project whose GKE clusters are listed
//! - `SLACK_BOT_USER_ACCESS_TOKEN` - Slack bot token (xoxb-...)
//! - `SLACK_SIGNING_SECRET` - Slack app signing secret
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//! - `HTTP_TIMEOUT_SECS` - Timeout for outbound Slack/GKE calls (default: 10)
//! - `SLACK_MAX_REQUEST_AGE_SECS` - Replay window for signed requests (default: 300, 0 disables)
//! - `SLACK_VERIFY_INTERACTIVE` - Also verify signatures on `/interactive` (default: false)
//! - `SLACK_API_BASE` - Slack Web API base URL (default: <https://slack.com/api>)
//! - `GKE_API_BASE` - GKE API base URL (default: <https://container.googleapis.com>)
//! - `GCP_METADATA_HOST` - Metadata server for ambient credentials
//!   (default: <http://metadata.google.internal>)
//! - `GCP_ACCESS_TOKEN` - Static OAuth access token, bypasses the metadata server
//! - `LOG_FORMAT` - `json` for structured log output, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_GKE_API_BASE: &str = "https://container.googleapis.com";
pub const DEFAULT_METADATA_HOST: &str = "http://metadata.google.internal";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bot configuration, built once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Google Cloud configuration
    pub gcp: GcpConfig,
    /// Slack configuration
    pub slack: SlackConfig,
    /// Emit JSON logs instead of human-readable text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Google Cloud configuration.
///
/// Implements `Debug` manually to redact the optional static access token.
#[derive(Clone)]
pub struct GcpConfig {
    /// Project whose clusters are listed and deleted
    pub project: String,
    /// GKE API base URL
    pub api_base: String,
    /// Metadata server base URL used for ambient credentials
    pub metadata_host: String,
    /// Static access token overriding the metadata server
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for GcpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpConfig")
            .field("project", &self.project)
            .field("api_base", &self.api_base)
            .field("metadata_host", &self.metadata_host)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Slack configuration.
///
/// Implements `Debug` manually to redact secrets.
#[derive(Clone)]
pub struct SlackConfig {
    /// Slack bot token (xoxb-...).
    pub bot_token: SecretString,
    /// Slack app signing secret for webhook verification.
    pub signing_secret: SecretString,
    /// Slack Web API base URL.
    pub api_base: String,
    /// Maximum accepted age of a signed request, `None` disables the check.
    pub max_request_age: Option<Duration>,
    /// Whether `/interactive` requires a valid signature too.
    pub verify_interactive: bool,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("max_request_age", &self.max_request_age)
            .field("verify_interactive", &self.verify_interactive)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or if an
    /// optional variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("HOST", "0.0.0.0")?;
        let port = parse_env_or_default("PORT", &DEFAULT_PORT.to_string())?;
        let http_timeout = Duration::from_secs(parse_env_or_default("HTTP_TIMEOUT_SECS", "10")?);

        let gcp = GcpConfig::from_env()?;
        let slack = SlackConfig::from_env()?;

        let log_json = get_optional_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate =
            parse_env_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "1.0")?;

        Ok(Self {
            host,
            port,
            http_timeout,
            gcp,
            slack,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Secrets that look like placeholders or have too little entropy.
    ///
    /// These do not prevent startup; call after logging is initialized and
    /// report each one.
    #[must_use]
    pub fn weak_secrets(&self) -> Vec<ConfigError> {
        [
            ("SLACK_BOT_USER_ACCESS_TOKEN", &self.slack.bot_token),
            ("SLACK_SIGNING_SECRET", &self.slack.signing_secret),
        ]
        .into_iter()
        .filter_map(|(name, secret)| validate_secret_strength(secret.expose_secret(), name).err())
        .collect()
    }
}

impl GcpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project: get_required_env("GCP_PROJECT_NAME")?,
            api_base: get_env_or_default("GKE_API_BASE", DEFAULT_GKE_API_BASE),
            metadata_host: get_env_or_default("GCP_METADATA_HOST", DEFAULT_METADATA_HOST),
            access_token: get_optional_env("GCP_ACCESS_TOKEN").map(SecretString::from),
        })
    }
}

impl SlackConfig {
    /// Load Slack configuration from environment.
    ///
    /// Weak-looking secrets are accepted here and surfaced by
    /// [`BotConfig::weak_secrets`].
    fn from_env() -> Result<Self, ConfigError> {
        let bot_token = get_required_env("SLACK_BOT_USER_ACCESS_TOKEN")?;
        let signing_secret = get_required_env("SLACK_SIGNING_SECRET")?;

        let max_age_secs: u64 = parse_env_or_default("SLACK_MAX_REQUEST_AGE_SECS", "300")?;
        let verify_interactive = parse_bool_env("SLACK_VERIFY_INTERACTIVE", false)?;

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            signing_secret: SecretString::from(signing_secret),
            api_base: get_env_or_default("SLACK_API_BASE", DEFAULT_SLACK_API_BASE),
            max_request_age: (max_age_secs > 0).then(|| Duration::from_secs(max_age_secs)),
            verify_interactive,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default string.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(default);
    };
    parse_bool(&value).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("expected a boolean, got '{value}'"))
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
