//! `reqwest` implementations of the viewer's network collaborators.

use std::time::Duration;

use async_trait::async_trait;

use viewer::asset::ModelAsset;
use viewer::config::StoreConfig;
use viewer::resolve::{ContentProbe, ProbeError, ProbeResponse};
use viewer::store::{MetadataStore, RestRequest, StoreError, rows_from_response};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl HttpStore {
    pub fn new(client: reqwest::Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    async fn fetch_rows(&self, request: RestRequest) -> Result<Vec<ModelAsset>, StoreError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        tracing::debug!(url = %request.url, "store request");
        let response = builder.send().await.map_err(|e| StoreError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| StoreError::Connection(e.to_string()))?;
        rows_from_response(status, &body)
    }
}

#[async_trait(?Send)]
impl MetadataStore for HttpStore {
    async fn get(&self, id: &str) -> Result<Option<ModelAsset>, StoreError> {
        let request = self.config.get_request(id)?;
        Ok(self.fetch_rows(request).await?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<ModelAsset>, StoreError> {
        let request = self.config.list_request()?;
        self.fetch_rows(request).await
    }
}

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl ContentProbe for HttpProbe {
    async fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => {
                let status = response.status();
                Ok(ProbeResponse {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_owned(),
                })
            }
            Err(err) if err.is_timeout() => Err(ProbeError::Timeout),
            Err(err) => Err(ProbeError::Network(err.to_string())),
        }
    }
}
