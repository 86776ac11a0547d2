// File: fleet-snapshot/src/fleet/http_client.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{Category, FleetApi, FleetItem, ObjectRef};
use crate::config::FleetApiConfig;
use crate::constants::http::{API_PREFIX, CONNECT_TIMEOUT};
use crate::errors::FleetApiError;

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<FleetItem>,
}

/// Fleet API backed by the fleet hub's HTTP endpoint
pub struct HttpFleetClient {
    base_url: Url,
    token: Option<String>,
    client: Client,
}

impl HttpFleetClient {
    pub fn new(config: &FleetApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build Fleet API client: {}", e))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid Fleet API base URL '{}': {}", config.base_url, e))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Fleet API base URL '{}' cannot carry a path", config.base_url);
        }

        Ok(Self {
            base_url,
            token: config.token.clone(),
            client,
        })
    }

    /// `base_url` + `/api/v1/` + `segments`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(API_PREFIX.split('/').filter(|s| !s.is_empty()))
                .extend(segments);
        }
        url
    }

    fn category_url(&self, category: Category) -> Url {
        self.endpoint(&[category.as_str()])
    }

    fn object_url(&self, reference: &ObjectRef) -> Url {
        match &reference.namespace {
            Some(namespace) => self.endpoint(&[
                "namespaces",
                namespace.as_str(),
                reference.kind.as_str(),
                reference.name.as_str(),
            ]),
            None => self.endpoint(&["cluster", reference.kind.as_str(), reference.name.as_str()]),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T, FleetApiError> {
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| FleetApiError::Request {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FleetApiError::NotFound {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FleetApiError::Request {
                resource: resource.to_string(),
                reason: format!("status {}: {}", status, error_text.trim()),
            });
        }

        response.json::<T>().await.map_err(|e| FleetApiError::InvalidResponse {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl FleetApi for HttpFleetClient {
    async fn list_category(&self, category: Category) -> Result<Vec<FleetItem>, FleetApiError> {
        let url = self.category_url(category);
        let list: ItemList = self.get_json(url, &format!("category {}", category)).await?;
        Ok(list.items)
    }

    async fn get_referenced(&self, reference: &ObjectRef) -> Result<FleetItem, FleetApiError> {
        let url = self.object_url(reference);
        self.get_json(url, &reference.to_string()).await
    }
}
