//! Configuration structures for ZAPI sessions.
//!
//! A session is configured once, at construction, from an explicit
//! [`ZapiConfig`]. Nothing is read from globals or mutated afterwards.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default call timeout in seconds.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;

/// Default ZAPI version.
pub const DEFAULT_API_VERSION: &str = "3.1";

/// Advanced settings for communicating with the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ConfigOptions {
    /// Timeout for a full request/response round trip, in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// ZAPI version used in the request URL (e.g. `3.1`)
    #[validate(length(min = 1))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whether to verify the appliance's TLS certificate
    #[serde(default)]
    pub tls_verify: bool,

    /// Optional path to an additional PEM CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,
}

const fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl ConfigOptions {
    /// Create options with default values.
    ///
    /// TLS verification is off by default: appliances ship with self-signed
    /// certificates. Enable it with [`ConfigOptions::with_tls_verify`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            api_version: default_api_version(),
            tls_verify: false,
            tls_ca_cert: None,
        }
    }

    /// Set the call timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.call_timeout_secs = seconds;
        self
    }

    /// Set the ZAPI version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set a custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Get the call timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection settings for one appliance.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ZapiConfig {
    /// Appliance address, `host[:port]` or a full `http(s)://` URL
    #[validate(length(min = 1))]
    pub host: String,

    /// ZAPI key sent with every request
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub zapi_key: SecretString,

    /// Advanced settings
    #[validate(nested)]
    #[serde(flatten)]
    pub options: ConfigOptions,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl ZapiConfig {
    /// Create a configuration with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be turned into a base URL.
    pub fn new(host: impl Into<String>, zapi_key: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            zapi_key: SecretString::from(zapi_key.into()),
            options: ConfigOptions::new(),
        };

        config.validate()?;
        config.parse_base_url()?;

        Ok(config)
    }

    /// Replace the advanced settings.
    #[must_use]
    pub fn with_options(mut self, options: ConfigOptions) -> Self {
        self.options = options;
        self
    }

    /// The base URL with a scheme applied; `https://` when the host has none.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if has_scheme(host) {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Parse and validate the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url())
            .map_err(|e| Error::ConfigError(format!("Invalid ZAPI host: {e}")))
    }
}

/// Returns true if `host` already starts with an `http://` or `https://` scheme.
fn has_scheme(host: &str) -> bool {
    let lower = host.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl Clone for ZapiConfig {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            zapi_key: SecretString::from(self.zapi_key.expose_secret().to_string()),
            options: self.options.clone(),
        }
    }
}
