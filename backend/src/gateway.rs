//! HTTP client for an external decryption gateway.
//!
//! `POST {url}/decryptions` submits an exported ciphertext (hex) under a
//! correlation id; `GET {url}/decryptions/{id}` reports `pending` or `ready`
//! with the plaintext. The gateway is the key holder of the compute engine
//! the tournament runs on.

use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tournament_settlement::RequestId;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct SubmitRequest {
    id: Uuid,
    request: u64,
    ciphertext: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Pending,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecryptionStatus {
    pub status: GatewayStatus,
    #[serde(default)]
    pub value: Option<u64>,
}

impl DecryptionStatus {
    /// Plaintext if ready; a ready status without a value is a protocol error.
    pub fn into_value(self) -> AppResult<Option<u64>> {
        match (self.status, self.value) {
            (GatewayStatus::Pending, _) => Ok(None),
            (GatewayStatus::Ready, Some(value)) => Ok(Some(value)),
            (GatewayStatus::Ready, None) => Err(AppError::Gateway(
                "ready status without a value".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, config: &GatewayConfig) -> AppResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client when a gateway URL is configured.
    pub fn from_config(config: &GatewayConfig) -> AppResult<Option<Self>> {
        config
            .url
            .as_deref()
            .map(|url| Self::new(url, config))
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn submit(&self, request: RequestId, ciphertext: &[u8]) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let body = SubmitRequest {
            id,
            request: request.0,
            ciphertext: hex::encode(ciphertext),
        };
        self.client
            .post(format!("{}/decryptions", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        debug!(%id, %request, "decryption submitted to gateway");
        Ok(id)
    }

    pub async fn status(&self, id: Uuid) -> AppResult<Option<u64>> {
        let status: DecryptionStatus = self
            .client
            .get(format!("{}/decryptions/{}", self.base_url, id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        status.into_value()
    }
}
