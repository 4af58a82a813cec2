#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Free-form place search used to centre the safety map.
//!
//! Queries the Nominatim / `OpenStreetMap` search endpoint and returns the
//! best match. Nominatim has strict rate limits: **1 request per second**
//! maximum on the public instance, and it requires an identifying
//! `User-Agent`.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public Nominatim search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// User agent sent with every search request.
pub const USER_AGENT: &str = concat!("safety_map/", env!("CARGO_PKG_VERSION"));

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceMatch {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Human-readable name of the match.
    pub display_name: Option<String>,
}

/// Errors from place search.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Reads `SAFETY_MAP_NOMINATIM_URL`, falling back to
/// [`DEFAULT_BASE_URL`].
#[must_use]
pub fn base_url_from_env() -> String {
    std::env::var("SAFETY_MAP_NOMINATIM_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Builds an HTTP client with the [`USER_AGENT`] Nominatim requires.
///
/// # Errors
///
/// Returns [`GeocodeError::Http`] if the client cannot be built.
pub fn client() -> Result<reqwest::Client, GeocodeError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Searches for a free-form place name (city, area, landmark).
///
/// A blank query returns `Ok(None)` without sending a request. The
/// caller is responsible for rate limiting.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn search(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
) -> Result<Option<PlaceMatch>, GeocodeError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }

    let resp = client
        .get(base_url)
        .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.error_for_status()?.json().await?;
    let found = parse_response(&body)?;

    if found.is_none() {
        log::debug!("No Nominatim match for '{query}'");
    }

    Ok(found)
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<PlaceMatch>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let latitude = coordinate(first, "lat")?;
    let longitude = coordinate(first, "lon")?;
    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(PlaceMatch {
        latitude,
        longitude,
        display_name,
    }))
}

/// Nominatim returns coordinates as strings.
fn coordinate(result: &serde_json::Value, field: &str) -> Result<f64, GeocodeError> {
    result[field]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: format!("Missing {field} in Nominatim response"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!([
            {
                "lat": "28.6139",
                "lon": "77.2090",
                "display_name": "New Delhi, Delhi, India"
            },
            {
                "lat": "0",
                "lon": "0",
                "display_name": "Elsewhere"
            }
        ]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 28.6139).abs() < 1e-4);
        assert!((result.longitude - 77.2090).abs() < 1e-4);
        assert_eq!(result.display_name.as_deref(), Some("New Delhi, Delhi, India"));
    }

    #[test]
    fn parses_empty_result() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_and_missing_coordinates() {
        assert!(matches!(
            parse_response(&serde_json::json!({"error": "bad"})),
            Err(GeocodeError::Parse { .. })
        ));
        assert!(matches!(
            parse_response(&serde_json::json!([{ "lat": "1.0" }])),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn blank_query_sends_nothing() {
        // Unroutable base URL: any request would fail.
        let client = client().unwrap();
        let result = search(&client, "http://127.0.0.1:9/search", "   ").await;
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("safety_map/"));
    }
}
