use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::endpoint::resolve_endpoint;
use super::error::RpcError;
use super::types::{RpcEnvelope, RpcResponse};

/// Anything that can exchange one JSON-RPC envelope for its `result`.
///
/// One attempt per call; callers decide what a failure means.
pub trait RpcTransport {
    fn call(&self, envelope: &RpcEnvelope) -> impl Future<Output = Result<Value, RpcError>> + Send;
}

/// Timeouts applied to every request, including endpoint probes.
#[derive(Debug, Clone, Copy)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP client bound to a single resolved JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    url: String,
}

impl RpcClient {
    /// Create a client pointing at a known endpoint, without probing it.
    pub fn new(url: impl Into<String>, settings: TransportSettings) -> Result<Self, RpcError> {
        Ok(Self::with_client(build_http_client(settings)?, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Probe `candidates` in order and bind to the first one that answers.
    pub async fn connect(candidates: &[String], settings: TransportSettings) -> Result<Self, RpcError> {
        let client = build_http_client(settings)?;
        let url = resolve_endpoint(&client, candidates).await?;
        Ok(Self::with_client(client, url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for RpcClient {
    async fn call(&self, envelope: &RpcEnvelope) -> Result<Value, RpcError> {
        debug!(method = %envelope.method, id = %envelope.id, "sending RPC request");

        let response = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .json(envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .json::<RpcResponse>()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;
        body.into_result(&envelope.method)
    }
}

fn build_http_client(settings: TransportSettings) -> Result<Client, RpcError> {
    let client = Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()?;
    Ok(client)
}
