//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CONTACTS_HOST` - Bind address (default: 127.0.0.1)
//! - `CONTACTS_PORT` - Listen port (default: 3000)
//! - `CONTACTS_DATA_FILE` - JSON file for the file backend (default: data/contacts.json)
//! - `CONTACTS_STATIC_DIR` - Static asset directory (default: crates/server/static)
//! - `KV_REST_API_URL` - Hosted key-value REST endpoint
//! - `KV_REST_API_TOKEN` - Hosted key-value bearer token
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! When both `KV_REST_API_*` variables are set the hosted backend is used;
//! when neither is set contacts are kept in the local JSON file. Setting only
//! one of them is a configuration error.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Path of the JSON document used by the file backend
    pub data_file: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Hosted key-value store, if configured
    pub kv: Option<KvConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production)
    pub sentry_environment: Option<String>,
}

/// Hosted key-value REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct KvConfig {
    /// REST endpoint (e.g. `https://xyz.upstash.io`)
    pub url: Url,
    /// Bearer token
    pub token: SecretString,
}

impl std::fmt::Debug for KvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvConfig")
            .field("url", &self.url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, if only one of the
    /// `KV_REST_API_*` variables is set, or if the KV token looks like a
    /// placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = or_default(&lookup, "CONTACTS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONTACTS_HOST".to_string(), e.to_string()))?;
        let port = or_default(&lookup, "CONTACTS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONTACTS_PORT".to_string(), e.to_string()))?;
        let data_file = PathBuf::from(or_default(
            &lookup,
            "CONTACTS_DATA_FILE",
            "data/contacts.json",
        ));
        let static_dir = PathBuf::from(or_default(
            &lookup,
            "CONTACTS_STATIC_DIR",
            "crates/server/static",
        ));

        let kv = KvConfig::from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            data_file,
            static_dir,
            kv,
            sentry_dsn: non_empty(&lookup, "SENTRY_DSN"),
            sentry_environment: non_empty(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl KvConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let url = non_empty(lookup, "KV_REST_API_URL");
        let token = non_empty(lookup, "KV_REST_API_TOKEN");

        match (url, token) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("KV_REST_API_TOKEN".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("KV_REST_API_URL".to_string())),
            (Some(url), Some(token)) => {
                let url = Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar("KV_REST_API_URL".to_string(), e.to_string())
                })?;
                validate_secret_strength(&token, "KV_REST_API_TOKEN")?;
                Ok(Some(Self {
                    url,
                    token: SecretString::from(token),
                }))
            }
        }
    }

    /// The bearer header value for this token.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a non-empty variable.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    non_empty(lookup, key).unwrap_or_else(|| default.to_string())
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
    let len = s.chars().count() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by the KV provider."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GOOD_TOKEN: &str = "AX3kQ9zLm2Pq7Rt5Vw8Yb1Cd4Ef6Gh0Jk";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.data_file, PathBuf::from("data/contacts.json"));
        assert!(config.kv.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_host_and_port_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("CONTACTS_HOST", "0.0.0.0"),
            ("CONTACTS_PORT", "8080"),
            ("CONTACTS_DATA_FILE", "/tmp/c.json"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.data_file, PathBuf::from("/tmp/c.json"));
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup_from(&[("CONTACTS_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "CONTACTS_PORT"));
    }

    #[test]
    fn test_kv_selected_when_both_set() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("KV_REST_API_URL", "https://eu1-kv.upstash.io"),
            ("KV_REST_API_TOKEN", GOOD_TOKEN),
        ]))
        .unwrap();
        let kv = config.kv.unwrap();
        assert_eq!(kv.url.host_str(), Some("eu1-kv.upstash.io"));
        assert_eq!(kv.bearer(), format!("Bearer {GOOD_TOKEN}"));
    }

    #[test]
    fn test_kv_half_configured_is_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[(
            "KV_REST_API_URL",
            "https://eu1-kv.upstash.io",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "KV_REST_API_TOKEN"));

        let err = ServerConfig::from_lookup(lookup_from(&[("KV_REST_API_TOKEN", GOOD_TOKEN)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "KV_REST_API_URL"));
    }

    #[test]
    fn test_kv_empty_values_mean_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("KV_REST_API_URL", ""),
            ("KV_REST_API_TOKEN", "  "),
        ]))
        .unwrap();
        assert!(config.kv.is_none());
    }

    #[test]
    fn test_kv_invalid_url() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            ("KV_REST_API_URL", "not a url"),
            ("KV_REST_API_TOKEN", GOOD_TOKEN),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "KV_REST_API_URL"));
    }

    #[test]
    fn test_kv_placeholder_token_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            ("KV_REST_API_URL", "https://eu1-kv.upstash.io"),
            ("KV_REST_API_TOKEN", "your-kv-token-here"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(GOOD_TOKEN) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_kv_config_debug_redacts_token() {
        let config = KvConfig {
            url: Url::parse("https://eu1-kv.upstash.io").unwrap(),
            token: SecretString::from(GOOD_TOKEN),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("eu1-kv.upstash.io"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(GOOD_TOKEN));
    }
}
