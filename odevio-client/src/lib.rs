//! Odevio HTTP Client
//!
//! A small, type-safe HTTP client for the Odevio build API.
//!
//! Every request carries an `Accept: application/json` header and a
//! `Authorization: Token <api key>` header.
//!
//! # Example
//!
//! ```no_run
//! use odevio_client::OdevioClient;
//!
//! #[tokio::main]
//! async fn main() -> odevio_client::Result<()> {
//!     let client = OdevioClient::new(odevio_client::DEFAULT_API_URL, "my-api-key");
//!
//!     let build = client.get_build("a1b2c3").await?;
//!     println!("Build {} is {:?}", build.key, build.status());
//!     Ok(())
//! }
//! ```

pub mod error;
mod builds;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Production Odevio API root
pub const DEFAULT_API_URL: &str = "https://odevio.com/api/v1";

/// HTTP client for the Odevio API
#[derive(Clone)]
pub struct OdevioClient {
    /// Base URL of the API (e.g., "https://odevio.com/api/v1")
    base_url: String,
    /// Token sent in the Authorization header
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl std::fmt::Debug for OdevioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdevioClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OdevioClient {
    /// Create a new Odevio client
    ///
    /// # Arguments
    /// * `base_url` - The API root (e.g., "https://odevio.com/api/v1")
    /// * `api_key` - The user's Odevio API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(base_url, api_key, Client::new())
    }

    /// Create a new Odevio client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Adds the headers every Odevio request needs
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .header(ACCEPT, "application/json")
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become [`ClientError::ApiError`] carrying the
    /// response body as is.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
