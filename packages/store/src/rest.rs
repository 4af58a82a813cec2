//! `PostgREST`-style client for the hosted store.
//!
//! The collection is exposed at `{url}/rest/v1/{table}`. Every request
//! carries the project key both as the `apikey` header and as a bearer
//! token. Filters use the `column=op.value` query syntax.

use async_trait::async_trait;
use safety_map_safety_models::{NewPointReport, PointReport};

use crate::{SafetyStore, StoreError};

/// Default collection name.
pub const DEFAULT_TABLE: &str = "location_safety";

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project base URL (e.g., `"https://abc.supabase.co"`).
    pub url: String,
    /// Project API key.
    pub api_key: String,
    /// Collection name.
    pub table: String,
}

impl StoreConfig {
    /// Reads `SAFETY_MAP_STORE_URL`, `SAFETY_MAP_STORE_KEY` and the
    /// optional `SAFETY_MAP_STORE_TABLE` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL or key is unset or empty.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL or key is missing or
    /// empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StoreError::Config {
                    message: format!("{key} environment variable not set"),
                })
        };

        let url = required("SAFETY_MAP_STORE_URL")?;
        let api_key = required("SAFETY_MAP_STORE_KEY")?;
        let table = lookup("SAFETY_MAP_STORE_TABLE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());

        Ok(Self {
            url,
            api_key,
            table,
        })
    }

    /// Full URL of the collection endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }
}

/// [`SafetyStore`] over HTTP.
pub struct RestStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl RestStore {
    /// Creates a store with its own HTTP client.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Creates a store sharing an existing HTTP client.
    #[must_use]
    pub const fn with_client(config: StoreConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    /// Turns a non-success response into [`StoreError::Status`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SafetyStore for RestStore {
    async fn list(&self) -> Result<Vec<PointReport>, StoreError> {
        let response = self
            .authorize(self.client.get(self.config.endpoint()))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .send()
            .await?;

        let text = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn insert(&self, report: NewPointReport) -> Result<PointReport, StoreError> {
        let response = self
            .authorize(self.client.post(self.config.endpoint()))
            .header("Prefer", "return=representation")
            .json(&[report])
            .send()
            .await?;

        let text = Self::check(response).await?.text().await?;
        let rows: Vec<PointReport> = serde_json::from_str(&text)?;
        let stored = rows.into_iter().next().ok_or(StoreError::EmptyInsert)?;

        log::info!(
            "Inserted {} report {} at ({}, {})",
            stored.kind,
            stored.id,
            stored.latitude,
            stored.longitude
        );

        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        let response = self
            .authorize(self.client.delete(self.config.endpoint()))
            .query(&[("id", filter.as_str())])
            .send()
            .await?;

        Self::check(response).await?;
        log::info!("Deleted report {id}");

        Ok(())
    }
}
