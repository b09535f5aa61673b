//! Read-only topology snapshots from the broker's HTTP management API.
//!
//! 通过代理的HTTP管理接口获取只读拓扑快照。

use crate::{
    config::{ConnectionConfig, Credentials, ManagementConfig},
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A raw management API answer.
///
/// 管理接口的原始响应。
#[derive(Debug, Clone)]
pub struct ManagementResponse {
    pub status: u16,
    pub body: Value,
    pub reason: String,
}

impl ManagementResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns the body of a 200 answer, or [`Error::RemoteQuery`] otherwise.
    pub fn into_body(self) -> Result<Value> {
        if self.is_ok() {
            Ok(self.body)
        } else {
            Err(Error::RemoteQuery {
                status: self.status,
                reason: self.reason,
            })
        }
    }
}

/// An exchange as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Vhost")]
    pub vhost: String,
}

/// A queue as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Messages")]
    pub messages: u64,
    #[serde(rename = "Vhost")]
    pub vhost: String,
}

#[derive(Debug, Deserialize)]
struct WireExchange {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    vhost: String,
}

#[derive(Debug, Deserialize)]
struct WireQueue {
    name: String,
    // Absent until the broker has collected queue stats.
    #[serde(default)]
    messages: u64,
    vhost: String,
}

/// Fetches and projects exchange and queue listings.
///
/// Results are rebuilt on every call; nothing is cached.
///
/// 获取并投影交换器和队列列表。每次调用都会重新构建结果，不做缓存。
#[derive(Debug, Clone)]
pub struct TopologyClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl TopologyClient {
    pub fn new(connection: &ConnectionConfig, management: &ManagementConfig) -> Result<Self> {
        let host = management.host.as_deref().unwrap_or(&connection.host);
        let http = reqwest::Client::builder()
            .timeout(management.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{}://{}:{}", management.scheme, host, management.port),
            credentials: connection.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues an authenticated GET for `segment` (e.g. `api/queues`).
    ///
    /// A body that is not JSON is an error only for success statuses; error
    /// pages come back as `Value::Null`.
    ///
    /// 对 `segment` 发起带认证的GET请求。
    pub async fn fetch(&self, segment: &str) -> Result<ManagementResponse> {
        let url = format!("{}/{}", self.base_url, segment.trim_start_matches('/'));
        debug!(url = %url, "Fetching management resource");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let bytes = response.bytes().await?;

        let body = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(e) if status.is_success() && !bytes.is_empty() => return Err(e.into()),
            Err(_) => Value::Null,
        };

        Ok(ManagementResponse {
            status: status.as_u16(),
            body,
            reason,
        })
    }

    /// Lists exchanges. `Ok(None)` means the broker answered with a non-200 status.
    pub async fn exchanges(&self) -> Result<Option<Vec<Exchange>>> {
        let body = match self.fetch("api/exchanges").await?.into_body() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to get exchanges");
                return Ok(None);
            }
        };
        let wire: Vec<WireExchange> = serde_json::from_value(body)?;
        Ok(Some(
            wire.into_iter()
                .map(|e| Exchange {
                    name: e.name,
                    kind: e.kind,
                    vhost: e.vhost,
                })
                .collect(),
        ))
    }

    /// Lists queues. `Ok(None)` means the broker answered with a non-200 status.
    pub async fn queues(&self) -> Result<Option<Vec<Queue>>> {
        let body = match self.fetch("api/queues").await?.into_body() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to get queues");
                return Ok(None);
            }
        };
        let wire: Vec<WireQueue> = serde_json::from_value(body)?;
        Ok(Some(
            wire.into_iter()
                .map(|q| Queue {
                    name: q.name,
                    messages: q.messages,
                    vhost: q.vhost,
                })
                .collect(),
        ))
    }
}
