//! Browser HTTP collaborators: the REST metadata store and the content probe.
//!
//! Both run on `fetch` through `gloo-net`. Request building and response
//! decoding live in the core so the CLI host shares them.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::{Either, select};
use gloo_net::http::{Method, RequestBuilder};
use gloo_timers::future::TimeoutFuture;

use viewer::asset::ModelAsset;
use viewer::config::StoreConfig;
use viewer::resolve::{ContentProbe, ProbeError, ProbeResponse};
use viewer::store::{MetadataStore, RestRequest, StoreError, rows_from_response};

/// Upper bound for the reachability check.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// PostgREST-style store reached with `fetch`.
pub struct RestStore {
    config: StoreConfig,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    async fn fetch_rows(&self, request: RestRequest) -> Result<Vec<ModelAsset>, StoreError> {
        let mut builder = RequestBuilder::new(&request.url).method(Method::GET);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let resp = builder.send().await.map_err(|e| StoreError::Connection(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| StoreError::Connection(e.to_string()))?;
        rows_from_response(status, &body)
    }
}

#[async_trait(?Send)]
impl MetadataStore for RestStore {
    async fn get(&self, id: &str) -> Result<Option<ModelAsset>, StoreError> {
        let request = self.config.get_request(id)?;
        Ok(self.fetch_rows(request).await?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<ModelAsset>, StoreError> {
        let request = self.config.list_request()?;
        self.fetch_rows(request).await
    }
}

/// `HEAD` probe over `fetch`, bounded by [`PROBE_TIMEOUT`].
#[derive(Default)]
pub struct FetchProbe;

#[async_trait(?Send)]
impl ContentProbe for FetchProbe {
    async fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        let request = Box::pin(RequestBuilder::new(url).method(Method::HEAD).send());
        let millis = u32::try_from(PROBE_TIMEOUT.as_millis()).unwrap_or(u32::MAX);
        match select(request, TimeoutFuture::new(millis)).await {
            Either::Left((Ok(resp), _)) => {
                Ok(ProbeResponse { status: resp.status(), status_text: resp.status_text() })
            }
            Either::Left((Err(err), _)) => Err(ProbeError::Network(err.to_string())),
            Either::Right(((), _)) => Err(ProbeError::Timeout),
        }
    }
}
