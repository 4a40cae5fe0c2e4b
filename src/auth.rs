//! Bearer credential checks.
//!
//! The identity provider signs users in through a hosted page and hands the
//! client a JWT, either as a `token` query parameter on the redirect URL or
//! as an `access_token`/`id_token` fragment (implicit flow). Before trusting
//! it the client decodes the payload locally and checks:
//!
//! - `iss` equals the configured user pool issuer,
//! - `client_id` (access tokens) or `aud` (ID tokens) equals the app client,
//! - `exp`, when present, is in the future.
//!
//! Signature verification is left to the backend and the provider's
//! user-info endpoint, which rejects forged or revoked tokens.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{ClientError, ClientResult};

/// Claims the client reads from a token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

/// `aud` may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, value: &str) -> bool {
        match self {
            Audience::One(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }
}

/// Pull a token out of a sign-in redirect URL.
///
/// Looks for `token` in the query string, then `access_token` or
/// `id_token` in the fragment.
pub fn token_from_redirect_url(url: &str) -> Option<String> {
    let (before_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };

    if let Some((_, query)) = before_fragment.split_once('?') {
        if let Some(token) = param(query, "token") {
            return Some(token);
        }
    }

    let fragment = fragment?;
    param(fragment, "access_token").or_else(|| param(fragment, "id_token"))
}

fn param(pairs: &str, name: &str) -> Option<String> {
    pairs
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Decode a JWT payload without verifying its signature.
pub fn decode_claims(token: &str) -> ClientResult<Claims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ClientError::AuthInvalid("invalid token format".to_string()));
    }
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| ClientError::AuthInvalid(format!("token payload is not base64: {}", e)))?;
    serde_json::from_slice(&payload)
        .map_err(|e| ClientError::AuthInvalid(format!("token payload is not JSON: {}", e)))
}

/// Check issuer, client and expiry against the configuration.
pub fn validate_claims(claims: &Claims, config: &AuthConfig, now: i64) -> ClientResult<()> {
    if claims.iss.as_deref() != Some(config.issuer.as_str()) {
        return Err(ClientError::AuthInvalid(
            "token is not from the configured user pool".to_string(),
        ));
    }

    let client_matches = claims.client_id.as_deref() == Some(config.client_id.as_str())
        || claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&config.client_id));
    if !client_matches {
        return Err(ClientError::AuthInvalid(
            "token is not from the configured application".to_string(),
        ));
    }

    if let Some(exp) = claims.exp {
        if exp <= now {
            return Err(ClientError::AuthInvalid("token has expired".to_string()));
        }
    }

    Ok(())
}

/// Decode and validate a token in one step.
pub fn validate_token(token: &str, config: &AuthConfig) -> ClientResult<Claims> {
    let claims = decode_claims(token)?;
    validate_claims(&claims, config, chrono::Utc::now().timestamp())?;
    Ok(claims)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    #[serde(default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserAttribute {
    name: String,
    value: String,
}

/// Look up the signed-in user's email with the provider's `GetUser` call.
pub async fn fetch_user_email(config: &AuthConfig, token: &str) -> ClientResult<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .post(config.user_info_url())
        .header(reqwest::header::CONTENT_TYPE, "application/x-amz-json-1.1")
        .header("X-Amz-Target", "AWSCognitoIdentityProviderService.GetUser")
        .json(&serde_json::json!({ "AccessToken": token }))
        .send()
        .await
        .map_err(|e| ClientError::AuthInvalid(format!("user info request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, body, "user info rejected");
        return Err(ClientError::AuthInvalid(format!(
            "identity provider rejected the token ({})",
            status
        )));
    }

    let user: GetUserResponse = response
        .json()
        .await
        .map_err(|e| ClientError::AuthInvalid(format!("user info response: {}", e)))?;

    user.user_attributes
        .into_iter()
        .find(|attr| attr.name == "email")
        .map(|attr| attr.value)
        .ok_or_else(|| ClientError::AuthInvalid("user has no email attribute".to_string()))
}
