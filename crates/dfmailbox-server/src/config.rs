//! Mailbox configuration from the environment

use dfmailbox_bridge::StaticOwnerResolver;
use dfmailbox_core::SigningIdentity;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PROFILE_API_URL: &str = "https://api.mojang.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime configuration of a mailbox
#[derive(Debug)]
pub struct MailboxConfig {
    /// Public `host:port` this mailbox answers challenges for
    pub address: String,
    /// Signing key behind this mailbox's own ownership proofs
    pub identity: SigningIdentity,
    pub port: u16,
    /// Bound on one outbound round-trip (ownership proofs, profile lookups)
    pub verify_timeout: Duration,
    /// `http` or `https` for outbound proofs
    pub federation_scheme: String,
    /// Enables `Bearer` credentials
    pub jwt_secret: Option<String>,
    /// Enables `Plot` credentials
    pub trust_plot_credentials: bool,
    /// Fixed username table; when absent the profile API is used
    pub known_owners: Option<StaticOwnerResolver>,
    pub profile_api_url: String,
    pub database_url: Option<String>,
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

impl MailboxConfig {
    /// Read `DFMC_*` variables from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let address = get("DFMC_ADDRESS").ok_or(ConfigError::Missing("DFMC_ADDRESS"))?;

        let identity = get("DFMC_PRIVATE_KEY")
            .ok_or(ConfigError::Missing("DFMC_PRIVATE_KEY"))
            .and_then(|key| {
                SigningIdentity::from_base64(key.trim()).map_err(|e| invalid("DFMC_PRIVATE_KEY", e))
            })?;

        let port = match get("DFMC_PORT") {
            Some(port) => port.trim().parse().map_err(|e| invalid("DFMC_PORT", e))?,
            None => DEFAULT_PORT,
        };

        let verify_timeout = match get("DFMC_VERIFY_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .map_err(|e| invalid("DFMC_VERIFY_TIMEOUT_SECS", e))?,
            ),
            None => crate::federation::DEFAULT_TIMEOUT,
        };

        let federation_scheme = get("DFMC_FEDERATION_SCHEME")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "http".into());
        if federation_scheme != "http" && federation_scheme != "https" {
            return Err(invalid("DFMC_FEDERATION_SCHEME", "expected http or https"));
        }

        let trust_plot_credentials = match get("DFMC_TRUST_PLOT_CREDENTIALS") {
            Some(flag) => flag
                .trim()
                .parse()
                .map_err(|e| invalid("DFMC_TRUST_PLOT_CREDENTIALS", e))?,
            None => false,
        };

        let known_owners = get("DFMC_KNOWN_OWNERS")
            .map(|pairs| StaticOwnerResolver::from_pairs(&pairs))
            .transpose()
            .map_err(|e| invalid("DFMC_KNOWN_OWNERS", e))?;

        Ok(Self {
            address: address.trim().to_string(),
            identity,
            port,
            verify_timeout,
            federation_scheme,
            jwt_secret: get("DFMC_JWT_SECRET"),
            trust_plot_credentials,
            known_owners,
            profile_api_url: get("DFMC_PROFILE_API_URL")
                .unwrap_or_else(|| DEFAULT_PROFILE_API_URL.into()),
            database_url: get("DFMC_DATABASE_URL"),
        })
    }
}
