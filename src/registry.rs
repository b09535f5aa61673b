//! Lookup of live managers by id.
//!
//! 按ID查找活动的管理器。

use crate::{
    error::{Error, Result},
    manager::{ConnectionManager, ManagerId},
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A shared id → manager map.
///
/// Entries are inserted once and stay until the whole registry is torn down.
///
/// 共享的ID到管理器的映射。条目插入后一直保留，直到整个注册表被拆除。
#[derive(Debug, Clone, Default)]
pub struct ManagerRegistry {
    managers: Arc<DashMap<ManagerId, ConnectionManager>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a manager under its own id.
    pub fn insert(&self, manager: ConnectionManager) -> ManagerId {
        let id = manager.id();
        self.managers.insert(id, manager);
        debug!(manager_id = %id, total = self.managers.len(), "Manager registered");
        id
    }

    /// Looks a manager up by the textual form of its id.
    ///
    /// Both malformed and unregistered ids fail with [`Error::UnknownManager`].
    ///
    /// 按ID的文本形式查找管理器。格式错误和未注册的ID都会返回错误。
    pub fn get(&self, id: &str) -> Result<ConnectionManager> {
        let parsed: ManagerId = id.parse()?;
        self.get_by_id(&parsed)
            .ok_or_else(|| Error::UnknownManager(id.to_string()))
    }

    pub fn get_by_id(&self, id: &ManagerId) -> Option<ConnectionManager> {
        self.managers.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Shuts every manager down and empties the registry.
    ///
    /// 关闭所有管理器并清空注册表。
    pub fn shutdown_all(&self) {
        let count = self.managers.len();
        for entry in self.managers.iter() {
            entry.value().shutdown();
        }
        self.managers.clear();
        info!(count, "All managers shut down");
    }
}
