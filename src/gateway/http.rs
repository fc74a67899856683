use super::{ModelGateway, RunRequest, RunResponse};
use crate::config::Config;
use crate::data::ModelMetadata;
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The gateway reached over HTTPS.
pub struct HttpGateway {
    client: Client,
    base: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let mut base = Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        // Endpoints are joined onto the base, which needs a trailing slash to
        // keep any path prefix it carries.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GatewayError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(&config.gateway_url, config.timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base.join(path).map_err(|e| GatewayError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            message: e.to_string(),
        })
    }

    async fn read_json<T: DeserializeOwned>(
        url: &Url,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn list_models(&self) -> Result<Vec<ModelMetadata>, GatewayError> {
        let url = self.endpoint("v1/models")?;
        debug!(%url, "fetching model catalog");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.to_string(),
                source,
            })?;
        Self::read_json(&url, response).await
    }

    async fn run_model(&self, request: &RunRequest) -> Result<RunResponse, GatewayError> {
        let url = self.endpoint("v1/model/run")?;
        debug!(%url, slug = %request.slug, "posting model run");
        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.to_string(),
                source,
            })?;
        Self::read_json(&url, response).await
    }
}
