use crate::core::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Best-effort taxonomy for one species name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conservation_status: Option<String>,
}

impl SpeciesInfo {
    pub fn scientific(name: impl Into<String>) -> Self {
        Self {
            scientific_name: Some(name.into()),
            conservation_status: None,
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.conservation_status = Some(status.into());
        self
    }
}

/// Third-party species lookup.
///
/// The result may omit any requested name; the whole batch may fail.
#[async_trait]
pub trait EnrichmentGateway: Send + Sync {
    async fn batch_lookup(&self, names: &[String]) -> Result<HashMap<String, SpeciesInfo>>;
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    names: &'a [String],
}

/// Enrichment over HTTP: `POST {endpoint}` with `{"names": [...]}`, answered
/// by a JSON object keyed by the requested names.
pub struct HttpEnrichmentGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpEnrichmentGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SyncError::Config(format!("enrichment client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl EnrichmentGateway for HttpEnrichmentGateway {
    async fn batch_lookup(&self, names: &[String]) -> Result<HashMap<String, SpeciesInfo>> {
        let mut request = self.client.post(&self.endpoint).json(&LookupRequest { names });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<HashMap<String, SpeciesInfo>>().await?)
    }
}
