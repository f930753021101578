//! HTTP transport port and its reqwest adapter.
//!
//! The publisher and subscriber talk to the bus only through
//! [`MessageTransport`], which keeps them testable against recording fakes
//! and mocks. [`HttpTransport`] is the production adapter; it applies
//! standard TLS validation and bounded per-operation timeouts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use gamebus_domain::{SCHEMA_NAMESPACE, VERSION_PROPERTY};

use crate::error::ClientError;

/// Timeout for a single publish call.
const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single pop call. The bus holds the request server-side for
/// up to 60 seconds, so the client allows a margin on top of that; this also
/// bounds how long a cooperative stop can take.
const POP_TIMEOUT: Duration = Duration::from_secs(70);

/// Port for the two bus operations the SDK performs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// POST one encoded envelope to a topic's message endpoint.
    ///
    /// Returns the raw response body on success.
    async fn post_message(
        &self,
        url: &str,
        token: &str,
        body: String,
    ) -> Result<String, ClientError>;

    /// Pop-and-consume one message from a subscription head endpoint
    /// (HTTP DELETE).
    ///
    /// `Ok(None)` means no message was available — including the 404 the bus
    /// answers while the topic or subscription is not yet provisioned
    /// server-side, which is benign and must not be reported as an error.
    async fn pop_message(&self, url: &str, token: &str) -> Result<Option<String>, ClientError>;
}

/// Production transport over reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(POP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn post_message(
        &self,
        url: &str,
        token: &str,
        body: String,
    ) -> Result<String, ClientError> {
        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, token)
            .header(VERSION_PROPERTY, SCHEMA_NAMESPACE)
            .timeout(POST_TIMEOUT)
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(ClientError::http(status.as_u16(), text))
        }
    }

    async fn pop_message(&self, url: &str, token: &str) -> Result<Option<String>, ClientError> {
        let response = self
            .client
            .delete(url)
            .header(header::AUTHORIZATION, token)
            .timeout(POP_TIMEOUT)
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        let status = response.status();

        // topic/subscription not provisioned yet
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(url, "subscription not provisioned yet");
            return Ok(None);
        }
        // server-side wait elapsed with nothing to deliver
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::http(status.as_u16(), text));
        }
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}
