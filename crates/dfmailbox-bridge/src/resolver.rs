//! Username to owner resolution
//!
//! Plot credentials name their owner by username. Usernames are not stable,
//! so they are resolved to the owner's UUID before anything is stored.

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BridgeError, Result};

/// Maximum username length accepted by the profile API
const MAX_USERNAME_LEN: usize = 16;

/// Resolves a human-readable username to a stable owner id
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    async fn resolve(&self, username: &str) -> Result<Uuid>;

    fn description(&self) -> &str {
        "owner resolver"
    }
}

/// Reject anything that could not be a username before it reaches a URL
fn check_username(username: &str) -> Result<()> {
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(BridgeError::InvalidFormat(format!("'{}' is not a valid username", username)))
    }
}

/// Fixed, case-insensitive username table
#[derive(Debug, Clone, Default)]
pub struct StaticOwnerResolver {
    owners: HashMap<String, Uuid>,
}

impl StaticOwnerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, username: &str, owner: Uuid) -> Self {
        self.owners.insert(username.to_lowercase(), owner);
        self
    }

    /// Parse `name=uuid,name=uuid` as found in configuration
    pub fn from_pairs(text: &str) -> Result<Self> {
        let mut resolver = Self::new();
        for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, id) = pair.split_once('=').ok_or_else(|| {
                BridgeError::InvalidFormat(format!("expected name=uuid, got '{}'", pair))
            })?;
            let owner = Uuid::parse_str(id.trim())
                .map_err(|e| BridgeError::InvalidFormat(format!("{}: {}", name, e)))?;
            resolver = resolver.with_owner(name.trim(), owner);
        }
        Ok(resolver)
    }
}

#[async_trait]
impl OwnerResolver for StaticOwnerResolver {
    async fn resolve(&self, username: &str) -> Result<Uuid> {
        check_username(username)?;
        self.owners
            .get(&username.to_lowercase())
            .copied()
            .ok_or_else(|| BridgeError::UnknownUsername(username.to_string()))
    }

    fn description(&self) -> &str {
        "static owner table"
    }
}

/// Profile API response (`GET /users/profiles/minecraft/{name}`)
#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
}

/// Resolves usernames through a remote profile API, with a TTL cache
pub struct ProfileApiResolver {
    base_url: String,
    cache: Cache<String, Uuid>,
    http_client: reqwest::Client,
}

impl ProfileApiResolver {
    /// Create a resolver whose lookups give up after `timeout`
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10_000)
                .build(),
            http_client,
        })
    }

    async fn fetch(&self, username: &str) -> Result<Uuid> {
        let url = format!("{}/users/profiles/minecraft/{}", self.base_url, username);
        debug!(url = %url, "Fetching profile");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            return Err(BridgeError::UnknownUsername(username.to_string()));
        }

        let profile: ProfileResponse = response
            .error_for_status()
            .map_err(|e| BridgeError::HttpError(e.to_string()))?
            .json()
            .await?;

        Uuid::parse_str(&profile.id)
            .map_err(|e| BridgeError::InvalidFormat(format!("profile id: {}", e)))
    }
}

#[async_trait]
impl OwnerResolver for ProfileApiResolver {
    async fn resolve(&self, username: &str) -> Result<Uuid> {
        check_username(username)?;
        let key = username.to_lowercase();

        if let Some(owner) = self.cache.get(&key).await {
            debug!(username = %username, "Using cached profile");
            return Ok(owner);
        }

        let owner = self.fetch(username).await?;
        self.cache.insert(key, owner).await;
        Ok(owner)
    }

    fn description(&self) -> &str {
        "profile API resolver"
    }
}
