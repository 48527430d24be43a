//! OAuth 1.0a request signing (HMAC-SHA1).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;

use super::PublishError;
use crate::config::Credentials;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LENGTH: usize = 32;

/// Signs requests on behalf of a user token.
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl OAuthSigner {
    #[must_use]
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    #[must_use]
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(
            &credentials.consumer_key,
            &credentials.consumer_secret,
            &credentials.access_token,
            &credentials.access_secret,
        )
    }

    /// Builds an `Authorization` header with a fresh nonce and timestamp.
    ///
    /// `params` are the query or form parameters that take part in the
    /// signature; JSON bodies are not signed.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let nonce = generate_nonce();
        self.authorization_header_with(method, url, params, &nonce, Utc::now().timestamp())
    }

    /// Builds an `Authorization` header for a given nonce and timestamp.
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, PublishError> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut signed = oauth_params.clone();
        signed.extend_from_slice(params);
        let signature = self.sign(&signature_base_string(method, url, &signed))?;
        oauth_params.push(("oauth_signature", signature.as_str()));

        let fields = oauth_params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {fields}"))
    }

    fn sign(&self, base_string: &str) -> Result<String, PublishError> {
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.token_secret)
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| PublishError::Signing(e.to_string()))?;
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

/// Builds the signature base string: method, URL and the sorted,
/// encoded parameter string, each percent-encoded and joined by `&`.
#[must_use]
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

/// RFC 3986 encoding: everything but `A-Z a-z 0-9 - . _ ~` is escaped.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}
