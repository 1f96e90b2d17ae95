//! HTTP client for the filing extraction service.
//!
//! Two endpoints are consumed: `xbrl-to-json` for structured cover metadata
//! and `extractor` for per-section plain text. The API credential is supplied
//! at construction and sent as a query token on every request.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{FilingDataApi, FilingMetadata};
use crate::types::PipelineError;

/// Remote extraction client in the style of the sec-api service.
#[derive(Debug, Clone)]
pub struct SecApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SecApiClient {
    /// Creates a client against `base_url` authenticating with `api_key`.
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl FilingDataApi for SecApiClient {
    async fn cover_metadata(&self, document_url: &Url) -> Result<FilingMetadata, PipelineError> {
        let response = self
            .client
            .get(self.endpoint("xbrl-to-json"))
            .query(&[
                ("htm-url", document_url.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| PipelineError::Extraction(format!("metadata request failed: {err}")))?
            .error_for_status()
            .map_err(|err| PipelineError::Extraction(format!("metadata request failed: {err}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| PipelineError::Extraction(format!("malformed metadata body: {err}")))?;
        let Value::Object(namespaces) = body else {
            return Err(PipelineError::Extraction(
                "metadata body is not a JSON object".to_string(),
            ));
        };

        let mut metadata = FilingMetadata::new();
        for (namespace, fields) in namespaces {
            let Value::Object(fields) = fields else {
                continue;
            };
            let flattened = fields
                .into_iter()
                .map(|(field, value)| (field, stringify(value)))
                .collect();
            metadata.insert(namespace, flattened);
        }
        debug!(url = %document_url, namespaces = metadata.len(), "cover metadata fetched");
        Ok(metadata)
    }

    async fn section_text(
        &self,
        document_url: &Url,
        section: &str,
    ) -> Result<String, PipelineError> {
        let response = self
            .client
            .get(self.endpoint("extractor"))
            .query(&[
                ("url", document_url.as_str()),
                ("item", section),
                ("type", "text"),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                PipelineError::Extraction(format!("section {section} request failed: {err}"))
            })?
            .error_for_status()
            .map_err(|err| {
                PipelineError::Extraction(format!("section {section} request failed: {err}"))
            })?;

        response.text().await.map_err(|err| {
            PipelineError::Extraction(format!("section {section} body unreadable: {err}"))
        })
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
