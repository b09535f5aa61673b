#![deny(clippy::expect_used, clippy::unwrap_used)]

//! Supervised broker connections with bounded-backoff recovery and
//! management API topology snapshots.
//!
//! 带有有界退避恢复和管理接口拓扑快照的受监管代理连接。

pub mod backoff;
pub mod config;
pub mod error;
pub mod gateway;
pub mod manager;
pub mod permission;
pub mod registry;
pub mod state;
pub mod topology;
pub mod transport;

pub use config::{BrokerSettings, Config, Credentials};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use manager::{ConnectionManager, ManagerId, ReconnectStatus};
pub use registry::ManagerRegistry;
pub use state::{ConnectionState, NativePhase};
