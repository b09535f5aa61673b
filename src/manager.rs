//! Supervision of a single broker connection.
//!
//! Each [`ConnectionManager`] is a handle to an actor task that owns one
//! transport, opens a channel whenever the transport opens, and schedules
//! bounded-backoff reconnections when it closes.
//!
//! 单个代理连接的监管。
//!
//! 每个 [`ConnectionManager`] 都是一个 actor 任务的句柄，该任务拥有一个传输，
//! 在传输打开时打开通道，并在其关闭时按有界退避调度重连。

mod actor;
mod command;
mod handle;

pub use handle::ConnectionManager;

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// The immutable identity of a manager.
///
/// 管理器的不可变标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagerId(Uuid);

impl ManagerId {
    /// Generates a fresh random (v4) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ManagerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ManagerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::UnknownManager(s.to_string()))
    }
}

/// Reconnection bookkeeping of a manager.
///
/// 管理器的重连记录。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconnectStatus {
    /// Reconnections scheduled over the manager's lifetime.
    pub scheduled: u32,
    /// Stored backoff counter, in delay units.
    pub stored_units: u32,
    /// Whether a reconnection wait is currently armed.
    pub pending: bool,
}
