//! Credential bootstrap for the external answer-generation service.
//!
//! The credential file lives at a remote location; a run first downloads it
//! to a caller-chosen path, then exchanges its contents for a short-lived
//! scoped token. The token travels inside [`ScopedToken`] — no environment
//! variable or other process-wide state is touched. Authentication failures
//! are fatal to the pipeline: nothing downstream can run without a token.

use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::types::PipelineError;

/// Short-lived bearer token scoped to the generation service.
#[derive(Debug, Clone)]
pub struct ScopedToken {
    pub token: String,
    /// Seconds until expiry, as reported by the token endpoint.
    pub expires_in: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Downloads the service credential file to `dest`.
///
/// Overwrites any existing file at that path and returns it on success.
pub async fn fetch_credential_file(
    client: &Client,
    url: &str,
    dest: impl AsRef<Path>,
) -> Result<PathBuf, PipelineError> {
    let dest = dest.as_ref().to_path_buf();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| PipelineError::Auth(format!("credential download failed: {err}")))?
        .error_for_status()
        .map_err(|err| PipelineError::Auth(format!("credential download failed: {err}")))?;
    let body = response
        .bytes()
        .await
        .map_err(|err| PipelineError::Auth(format!("credential download failed: {err}")))?;

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&dest, &body).await?;
    info!(path = %dest.display(), bytes = body.len(), "credential file downloaded");
    Ok(dest)
}

/// Exchanges the credential file at `credential_path` for a scoped token.
pub async fn exchange_for_token(
    client: &Client,
    token_url: &str,
    credential_path: impl AsRef<Path>,
) -> Result<ScopedToken, PipelineError> {
    let credential = fs::read_to_string(credential_path.as_ref()).await?;
    let credential: serde_json::Value = serde_json::from_str(&credential)
        .map_err(|err| PipelineError::Auth(format!("malformed credential file: {err}")))?;

    let response = client
        .post(token_url)
        .json(&credential)
        .send()
        .await
        .map_err(|err| PipelineError::Auth(format!("token exchange failed: {err}")))?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::Auth(format!(
            "token endpoint returned {status}: {body}"
        )));
    }
    let parsed: TokenResponse = response
        .json()
        .await
        .map_err(|err| PipelineError::Auth(format!("malformed token response: {err}")))?;

    info!(expires_in = parsed.expires_in, "scoped token issued");
    Ok(ScopedToken {
        token: parsed.access_token,
        expires_in: parsed.expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn downloads_credential_file_to_dest() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/creds.json");
                then.status(200).body(r#"{"client_id":"abc"}"#);
            })
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested/creds.json");
        let client = Client::new();
        let path = fetch_credential_file(&client, &server.url("/creds.json"), &dest)
            .await
            .unwrap();

        mock.assert_async().await;
        let saved = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(saved, r#"{"client_id":"abc"}"#);
    }

    #[tokio::test]
    async fn exchanges_credentials_for_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200)
                    .json_body(serde_json::json!({"access_token": "t-123", "expires_in": 3600}));
            })
            .await;

        let dir = tempdir().unwrap();
        let cred_path = dir.path().join("creds.json");
        tokio::fs::write(&cred_path, r#"{"client_id":"abc"}"#)
            .await
            .unwrap();

        let client = Client::new();
        let token = exchange_for_token(&client, &server.url("/token"), &cred_path)
            .await
            .unwrap();
        assert_eq!(token.token, "t-123");
        assert_eq!(token.expires_in, 3600);
    }

    #[tokio::test]
    async fn rejected_exchange_is_an_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(403).body("forbidden");
            })
            .await;

        let dir = tempdir().unwrap();
        let cred_path = dir.path().join("creds.json");
        tokio::fs::write(&cred_path, "{}").await.unwrap();

        let client = Client::new();
        let err = exchange_for_token(&client, &server.url("/token"), &cred_path)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Auth(_)));
    }
}
