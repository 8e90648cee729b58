//! HTTP client for the SmartLibrary API.
//!
//! Endpoint groups:
//! - `auth`: login, registration, current user
//! - `books`: catalog, book details, reviews
//! - `profile`: reservations, profile image, account deletion
//! - `admin`: book and review management behind the admin gate
//!
//! Every non-success response is classified into an [`ApiError`] from its
//! status code and a typed [`ErrorBody`]. Nothing is retried, except the
//! opt-in admin route fallback.

pub mod admin;
pub mod auth;
pub mod books;
pub mod error;
pub mod profile;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;

pub use error::{ApiError, ErrorBody};

/// Client for the SmartLibrary REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    admin_fallback_prefix: Option<String>,
}

impl ApiClient {
    /// Build a client from config. No token is attached yet.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self::with_http(http, config))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.api_url.clone(),
            token: None,
            admin_fallback_prefix: config.admin_fallback_prefix.clone(),
        }
    }

    /// Attach a bearer token to subsequent requests.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.is_empty());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the bearer token attached when one is set.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Request that requires a token.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        if self.token.is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        Ok(self.request(method, path))
    }

    /// Send a request and turn non-success statuses into classified errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            ApiError::Network(e)
        })?;

        let status = response.status();
        debug!(status = %status, url = %response.url(), "Response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, &body))
    }

    /// Send and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(ApiError::Decode)
    }

    /// Send and discard the body.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Client pointed at a mock server, optionally logged in.
    pub fn client(server: &mockito::Server, token: Option<&str>) -> ApiClient {
        let config = ClientConfig::new(server.url());
        ApiClient::new(&config)
            .unwrap()
            .with_token(token.map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_ignored() {
        let client = ApiClient::new(&ClientConfig::default())
            .unwrap()
            .with_token(Some(String::new()));
        assert!(!client.has_token());
    }

    #[test]
    fn test_authed_requires_token() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        assert!(matches!(
            client.authed(Method::GET, "/auth/me"),
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_bearer_header_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .create_async()
            .await;

        let client = test_support::client(&server, Some("secret"));
        client
            .send_empty(client.request(Method::GET, "/ping"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_network_error() {
        let config = ClientConfig::new("http://127.0.0.1:1");
        let client = ApiClient::new(&config).unwrap();

        let result = client.send_empty(client.request(Method::GET, "/")).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
