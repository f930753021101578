//! Shared-access-signature (SAS) token derivation and caching.
//!
//! Tokens are derived locally from the shared key (no network round trip):
//! an HMAC-SHA256 over the URL-escaped audience realm and an expiry
//! timestamp, assembled into the `SharedAccessSignature` header format the
//! bus expects. One provider caches one token and renews it lazily under a
//! lock, so concurrent callers never run two renewals.

use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::MAX_CREDENTIAL_LEN;
use crate::error::ClientError;

type HmacSha256 = Hmac<Sha256>;

/// Default token time-to-live: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// A signed access token plus its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl SasToken {
    /// The full `Authorization` header value.
    pub fn value(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Derives and caches SAS tokens for one audience realm.
pub struct SasTokenProvider {
    realm: String,
    key_name: String,
    key_secret: String,
    ttl: Duration,
    cached: Mutex<Option<SasToken>>,
}

impl SasTokenProvider {
    /// Create a provider with the default one-hour token TTL.
    ///
    /// Fails fast with a configuration error when the key name or secret is
    /// missing or oversized; these are never retried.
    pub fn new(
        realm: impl Into<String>,
        key_name: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_ttl(
            realm,
            key_name,
            key_secret,
            Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        )
    }

    pub fn with_ttl(
        realm: impl Into<String>,
        key_name: impl Into<String>,
        key_secret: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self, ClientError> {
        let key_name = key_name.into();
        let key_secret = key_secret.into();

        if key_name.is_empty() {
            return Err(ClientError::configuration("key name must be set"));
        }
        if key_name.len() > MAX_CREDENTIAL_LEN {
            return Err(ClientError::configuration(format!(
                "key name exceeds {MAX_CREDENTIAL_LEN} characters"
            )));
        }
        if key_secret.is_empty() {
            return Err(ClientError::configuration("key secret must be set"));
        }
        if key_secret.len() > MAX_CREDENTIAL_LEN {
            return Err(ClientError::configuration(format!(
                "key secret exceeds {MAX_CREDENTIAL_LEN} characters"
            )));
        }

        Ok(Self {
            realm: realm.into(),
            key_name,
            key_secret,
            ttl,
            cached: Mutex::new(None),
        })
    }

    /// Get the current token, renewing it if absent or expired.
    ///
    /// The cached token is reused until its expiry timestamp is reached.
    /// Renewal is a pure local computation performed under the cache lock,
    /// so only one renewal executes at a time.
    pub fn token(&self) -> Result<SasToken, ClientError> {
        self.token_at(Utc::now())
    }

    fn token_at(&self, now: DateTime<Utc>) -> Result<SasToken, ClientError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(token) = cached.as_ref() {
            if !token.is_expired_at(now) {
                return Ok(token.clone());
            }
        }

        let token = self.build_token(now)?;
        tracing::debug!(expires_at = %token.expires_at, "derived new access token");
        *cached = Some(token.clone());
        Ok(token)
    }

    fn build_token(&self, now: DateTime<Utc>) -> Result<SasToken, ClientError> {
        let expires_at = now + self.ttl;
        let expiry_secs = expires_at.timestamp();
        let audience = form_escape(&self.realm);

        let to_sign = format!("{audience}\n{expiry_secs}");
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|e| ClientError::auth(format!("invalid signing key: {e}")))?;
        mac.update(to_sign.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let token = format!(
            "SharedAccessSignature sr={audience}&sig={}&se={expiry_secs}&skn={}",
            form_escape(&signature),
            form_escape(&self.key_name),
        );

        Ok(SasToken { token, expires_at })
    }
}

/// Form-urlencoded escaping, matching what the bus applies to token fields.
fn form_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
