//! Authorization hook for topology queries.

use crate::{error::Result, manager::ConnectionManager};
use serde::Serialize;
use std::fmt;

/// Operations that can be guarded.
///
/// 可以被保护的操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ExchangeCreate,
    ExchangeRead,
    ExchangeUpdate,
    ExchangeDelete,
    QueueCreate,
    QueueRead,
    QueueUpdate,
    QueueDelete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExchangeCreate => "EXCHANGE_CREATE",
            Self::ExchangeRead => "EXCHANGE_READ",
            Self::ExchangeUpdate => "EXCHANGE_UPDATE",
            Self::ExchangeDelete => "EXCHANGE_DELETE",
            Self::QueueCreate => "QUEUE_CREATE",
            Self::QueueRead => "QUEUE_READ",
            Self::QueueUpdate => "QUEUE_UPDATE",
            Self::QueueDelete => "QUEUE_DELETE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a manager may perform an operation.
///
/// Returning `Ok(false)` makes the caller reject with `Error::Forbidden`.
///
/// 决定管理器是否可以执行某个操作。返回 `Ok(false)` 时调用方以 `Error::Forbidden` 拒绝。
pub trait PermissionPolicy: Send + Sync + fmt::Debug + 'static {
    fn check(&self, manager: &ConnectionManager, permission: Permission) -> Result<bool>;
}

/// Permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionPolicy for AllowAll {
    fn check(&self, _manager: &ConnectionManager, _permission: Permission) -> Result<bool> {
        Ok(true)
    }
}
