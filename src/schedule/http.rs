//! HTTP schedule source, `GET {base_url}/{zone_code}`.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use super::{ProviderResponse, Schedule, ScheduleSource};
use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::zone::Zone;

/// Fetches schedules from the remote provider.
pub struct HttpSource {
    /// HTTP client, reused across fetches for connection pooling.
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("waktu/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn url_for(&self, zone: &Zone) -> String {
        format!("{}/{}", self.base_url, zone.code)
    }
}

/// Sort a transport error into the user-facing categories.
fn classify(e: &reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::Request(e.to_string())
    } else if e.is_decode() {
        FetchError::InvalidResponse
    } else {
        FetchError::Network
    }
}

#[async_trait]
impl ScheduleSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_today(&self, zone: &Zone, today: NaiveDate) -> Result<Schedule, FetchError> {
        let url = self.url_for(zone);
        tracing::debug!(%url, "fetching schedule");

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "schedule request failed");
            classify(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "provider returned an error status");
            return Err(FetchError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let body: ProviderResponse = response.json().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "could not decode provider response");
            FetchError::InvalidResponse
        })?;

        let schedule = body.into_schedule(today)?;
        tracing::info!(zone = %zone, events = schedule.len(), "fetched schedule");
        Ok(schedule)
    }
}
