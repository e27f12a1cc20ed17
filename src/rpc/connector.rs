//! HTTP seam between the transport and the network.
//!
//! The transport only sees [`Connector`]; tests swap in scripted doubles.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::rpc::jsonrpc::RpcRequest;

/// Transport-level failures. All of them are retryable on another node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("unreadable response body: {0}")]
    Body(String),
}

/// Posts one JSON-RPC request to one node and returns the raw JSON body.
///
/// `timeout` bounds the whole request, response body included.
#[async_trait]
pub trait Connector: Debug + Send + Sync {
    async fn post(
        &self,
        url: &Url,
        request: &RpcRequest,
        timeout: Duration,
    ) -> Result<Value, ConnectorError>;
}

/// reqwest-backed connector shared by all nodes of a pool.
///
/// Only connection setup is bounded client-wide; each request carries the
/// caller's timeout.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new(connect_timeout: Duration) -> BlockchainResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("hive-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BlockchainError::Transport {
                attempts: 0,
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn post(
        &self,
        url: &Url,
        request: &RpcRequest,
        timeout: Duration,
    ) -> Result<Value, ConnectorError> {
        let resp = self
            .client
            .post(url.clone())
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectorError::Timeout
                } else {
                    ConnectorError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ConnectorError::Status(status.as_u16()));
        }

        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                ConnectorError::Timeout
            } else {
                ConnectorError::Body(e.to_string())
            }
        })?;
        serde_json::from_str(&text).map_err(|e| ConnectorError::Body(e.to_string()))
    }
}
