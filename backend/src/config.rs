//! Runtime configuration.
//!
//! Resolved once at startup from the process environment (after `.env` has
//! been loaded) and passed into the services; handlers never read
//! environment variables.

use std::net::SocketAddr;

use url::Url;

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:glucolink.db";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidAddr { name: &'static str, value: String },
    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("incomplete Twilio configuration, missing {0}")]
    IncompleteTwilio(&'static str),
}

/// Credentials for placing calls through Twilio
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    /// `None` allows any origin
    pub cors_allow_origin: Option<String>,
    /// Externally reachable base URL, used to build call-back URLs
    pub public_base_url: Url,
    /// `None` disables outbound calls
    pub twilio: Option<TwilioConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr_raw = var("GLUCOLINK_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_raw.parse().map_err(|_| ConfigError::InvalidAddr {
            name: "GLUCOLINK_ADDR",
            value: addr_raw.clone(),
        })?;

        let base_raw = var("PUBLIC_BASE_URL").unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string());
        let public_base_url = Url::parse(&base_raw)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidUrl {
                name: "PUBLIC_BASE_URL",
                value: base_raw.clone(),
            })?;

        let twilio = match (
            var("TWILIO_ACCOUNT_SID"),
            var("TWILIO_AUTH_TOKEN"),
            var("TWILIO_FROM_NUMBER"),
        ) {
            (None, None, None) => None,
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            (None, _, _) => return Err(ConfigError::IncompleteTwilio("TWILIO_ACCOUNT_SID")),
            (_, None, _) => return Err(ConfigError::IncompleteTwilio("TWILIO_AUTH_TOKEN")),
            (_, _, None) => return Err(ConfigError::IncompleteTwilio("TWILIO_FROM_NUMBER")),
        };

        Ok(Self {
            addr,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            cors_allow_origin: var("CORS_ALLOW_ORIGIN").filter(|origin| origin != "*"),
            public_base_url,
            twilio,
        })
    }
}
