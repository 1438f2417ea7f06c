//! Facility directory client over the `fitmap` HTTP API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fitmap::facility::{parse_records, FacilityObject};
use fitmap::geo::LocationSample;
use fitmap::store::FacilityStore;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Destination for raw location samples.
#[async_trait]
pub trait LocationSink: Send + Sync {
    async fn record_location(&self, user_id: &str, sample: &LocationSample) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationReport<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    sample: &'a LocationSample,
}

/// HTTP-backed facility store and location sink.
///
/// Records that fail to parse are dropped individually; one bad record
/// never fails the whole fetch.
pub struct HttpFacilityStore {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpFacilityStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build directory HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    async fn fetch_records(&self, parent: Option<&str>) -> Result<Vec<FacilityObject>> {
        let url = format!("{}/api/objects", self.base_url);
        let mut request = self.http_client.get(&url);
        if let Some(parent) = parent {
            request = request.query(&[("parent", parent)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to facility directory")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Facility directory returned error status {}: {}", status, body);
        }

        let records: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse facility directory response")?;
        let objects = parse_records(&records);

        debug!(
            received = records.len(),
            parsed = objects.len(),
            "Fetched facility records"
        );

        Ok(objects)
    }
}

#[async_trait]
impl FacilityStore for HttpFacilityStore {
    async fn fetch_all(&self) -> Result<Vec<FacilityObject>> {
        self.fetch_records(None).await
    }

    async fn fetch_by_parent(&self, parent_id: &str) -> Result<Vec<FacilityObject>> {
        self.fetch_records(Some(parent_id)).await
    }
}

#[async_trait]
impl LocationSink for HttpFacilityStore {
    async fn record_location(&self, user_id: &str, sample: &LocationSample) -> Result<()> {
        let url = format!("{}/api/locations", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&LocationReport { user_id, sample })
            .send()
            .await
            .context("Failed to send location to facility directory")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Location upload returned error status {}: {}", status, body);
        }

        Ok(())
    }
}
