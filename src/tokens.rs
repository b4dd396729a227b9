//! Threads access-token helpers for the CLI.
//!
//! Long-lived tokens are obtained by exchanging an authorization code from
//! the Authorization Window, and can be refreshed any time after they are 24
//! hours old. The endpoints are treated as opaque HTTP calls; the server
//! itself only ever consumes the resulting credential string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ACCESS_TOKEN_ENDPOINT: &str = "https://graph.threads.net/oauth/access_token";
const EXCHANGE_ENDPOINT: &str = "https://graph.threads.net/access_token";
const REFRESH_ENDPOINT: &str = "https://graph.threads.net/refresh_access_token";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token endpoint error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// The short-lived token returned for an authorization code.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortLivedToken {
    pub access_token: String,
    pub user_id: u64,
}

/// A long-lived token, valid for roughly 60 days.
#[derive(Debug, Serialize, Deserialize)]
pub struct LongLivedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Both tokens produced by a full code exchange.
#[derive(Debug, Serialize)]
pub struct TokenBundle {
    pub user_id: u64,
    pub short_lived: ShortLivedToken,
    pub long_lived: LongLivedToken,
}

/// Swap an authorization code for a short-lived token, then exchange that for
/// a long-lived one.
pub async fn exchange(
    app_id: &str,
    app_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenBundle, TokenError> {
    let client = reqwest::Client::new();

    let response = client
        .post(ACCESS_TOKEN_ENDPOINT)
        .json(&serde_json::json!({
            "client_id": app_id,
            "client_secret": app_secret,
            "code": code,
            "grant_type": "authorization_code",
            "redirect_uri": redirect_uri,
        }))
        .send()
        .await?;
    let short_lived: ShortLivedToken = parse_token_response(response).await?;

    let response = client
        .get(EXCHANGE_ENDPOINT)
        .query(&[
            ("grant_type", "th_exchange_token"),
            ("client_secret", app_secret),
            ("access_token", &short_lived.access_token),
        ])
        .send()
        .await?;
    let long_lived: LongLivedToken = parse_token_response(response).await?;

    Ok(TokenBundle {
        user_id: short_lived.user_id,
        short_lived,
        long_lived,
    })
}

/// Refresh an unexpired long-lived token for a new, life-extended one.
pub async fn refresh(access_token: &str) -> Result<LongLivedToken, TokenError> {
    let response = reqwest::Client::new()
        .get(REFRESH_ENDPOINT)
        .query(&[
            ("grant_type", "th_refresh_token"),
            ("access_token", access_token),
        ])
        .send()
        .await?;

    parse_token_response(response).await
}

async fn parse_token_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TokenError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(TokenError::Api { status, message });
    }
    Ok(response.json().await?)
}
