//! Configuration for homedns
//!
//! Loaded once at startup from a YAML file and passed into every component
//! at construction. Immutable for the process lifetime. A missing or
//! malformed file is fatal: defaults are never silently substituted for
//! required fields.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Main homedns configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Domain the managed records live under (e.g. "example.com")
    pub domain: String,

    /// Host label prefixed to the domain (e.g. "home" in "home.example.com")
    #[serde(default = "default_sub_domain")]
    pub sub_domain: String,

    /// Whether to manage an AAAA record alongside the A record
    #[serde(default)]
    pub enable_ipv6: bool,

    /// Seconds between poll cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// DNS provider selection and credentials
    pub dns: DnsConfig,
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read, is not valid
    /// YAML, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: Config = serde_yaml::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid YAML in {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(Error::config("domain cannot be empty"));
        }
        if self.sub_domain.is_empty() {
            return Err(Error::config("sub_domain cannot be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::config("poll_interval_secs must be > 0"));
        }

        self.dns.validate()
    }

    /// The fully-qualified name of the managed records ("sub.domain")
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.sub_domain, self.domain)
    }
}

/// DNS provider credentials, selected by the `type` field
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DnsConfig {
    /// Signed-request provider (access-key/secret pair)
    Aliyun {
        aliyun_access_key: String,
        aliyun_access_secret: String,
    },

    /// Token-header provider (email + API key headers)
    Cloudflare { email: String, api_key: String },
}

impl DnsConfig {
    /// Validate the provider credentials
    pub fn validate(&self) -> Result<()> {
        match self {
            DnsConfig::Aliyun {
                aliyun_access_key,
                aliyun_access_secret,
            } => {
                if aliyun_access_key.is_empty() || aliyun_access_secret.is_empty() {
                    return Err(Error::config(
                        "dns.aliyun_access_key and dns.aliyun_access_secret are required",
                    ));
                }
                Ok(())
            }
            DnsConfig::Cloudflare { email, api_key } => {
                if email.is_empty() || api_key.is_empty() {
                    return Err(Error::config("dns.email and dns.api_key are required"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            DnsConfig::Aliyun { .. } => "aliyun",
            DnsConfig::Cloudflare { .. } => "cloudflare",
        }
    }
}

// Credentials never appear in Debug output.
impl std::fmt::Debug for DnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsConfig::Aliyun {
                aliyun_access_key, ..
            } => f
                .debug_struct("Aliyun")
                .field("aliyun_access_key", aliyun_access_key)
                .field("aliyun_access_secret", &"<REDACTED>")
                .finish(),
            DnsConfig::Cloudflare { email, .. } => f
                .debug_struct("Cloudflare")
                .field("email", email)
                .field("api_key", &"<REDACTED>")
                .finish(),
        }
    }
}

fn default_sub_domain() -> String {
    "home".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}
