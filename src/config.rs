//! 定义了连接、重连和管理接口的可配置参数。
//! Defines configurable parameters for connections, reconnection and the management API.

use crate::error::{Error, Result};
use std::{fmt, time::Duration};

/// A structure containing all configurable parameters for a managed connection.
///
/// 包含托管连接所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Broker connection parameters.
    /// 代理连接参数。
    pub connection: ConnectionConfig,

    /// Reconnection policy parameters.
    /// 重连策略参数。
    pub reconnect: ReconnectConfig,

    /// HTTP management API parameters.
    /// HTTP管理接口参数。
    pub management: ManagementConfig,
}

impl Config {
    /// Builds a configuration for one user against the given broker.
    ///
    /// 为指定代理上的单个用户构建配置。
    pub fn for_user(host: impl Into<String>, port: u16, credentials: Credentials) -> Self {
        Self {
            connection: ConnectionConfig {
                host: host.into(),
                port,
                credentials,
                ..ConnectionConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Username and secret used both for the broker connection and the management API.
///
/// 用于代理连接和管理接口的用户名和密码。
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Broker connection parameters, handed to the underlying client library as-is.
///
/// 代理连接参数，原样交给底层客户端库。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Broker host name or address.
    /// 代理主机名或地址。
    pub host: String,
    /// Broker wire protocol port.
    /// 代理协议端口。
    pub port: u16,
    /// Credentials for this connection.
    /// 此连接的凭据。
    pub credentials: Credentials,
    /// Heartbeat interval negotiated with the broker.
    /// 与代理协商的心跳间隔。
    pub heartbeat: Duration,
    /// Delay the client library waits between its own connection attempts.
    /// 客户端库自身连接尝试之间的等待时间。
    pub retry_delay: Duration,
    /// How many times the client library tries before reporting an open error.
    /// 客户端库在报告打开错误之前的尝试次数。
    pub connection_attempts: u32,
    /// Socket connect/read timeout.
    /// 套接字超时时间。
    pub socket_timeout: Duration,
}

/// Reconnection policy parameters.
///
/// 重连策略参数。
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// The length of one backoff unit.
    /// 一个退避单位的时长。
    pub delay_unit: Duration,
    /// The ceiling of the backoff delay, in units.
    /// 退避延迟的上限（以单位计）。
    pub max_delay_units: u32,
    /// How many reconnections may be scheduled over the manager's lifetime.
    /// Zero means unlimited.
    ///
    /// 管理器生命周期内最多可调度的重连次数。零表示不限制。
    pub max_reconnections: u32,
}

/// HTTP management API parameters.
///
/// HTTP管理接口参数。
#[derive(Debug, Clone)]
pub struct ManagementConfig {
    pub scheme: String,
    /// Management host. Falls back to the broker host when `None`.
    /// 管理主机。为 `None` 时使用代理主机。
    pub host: Option<String>,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5672,
            credentials: Credentials::default(),
            heartbeat: Duration::from_secs(60),
            retry_delay: Duration::ZERO,
            connection_attempts: 2,
            socket_timeout: Duration::from_secs(15),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_unit: Duration::from_secs(1),
            max_delay_units: 30,
            max_reconnections: 5,
        }
    }
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: None,
            port: 15672,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Process-wide broker location used when opening connections for new users.
///
/// 为新用户打开连接时使用的进程级代理地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub management_port: u16,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5672,
            management_port: 15672,
        }
    }
}

impl BrokerSettings {
    /// Reads `HOST`, `PORT` and `MANAGEMENT_PORT` from the environment,
    /// keeping defaults for unset values.
    ///
    /// 从环境变量读取 `HOST`、`PORT` 和 `MANAGEMENT_PORT`，未设置的值保持默认。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BrokerSettings::from_env`] but with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(host) = lookup("HOST").filter(|v| !v.trim().is_empty()) {
            settings.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            settings.port = parse_port("PORT", &port)?;
        }
        if let Some(port) = lookup("MANAGEMENT_PORT") {
            settings.management_port = parse_port("MANAGEMENT_PORT", &port)?;
        }
        Ok(settings)
    }

    /// Builds a per-user [`Config`] against this broker.
    pub fn config_for(&self, credentials: Credentials) -> Config {
        let mut config = Config::for_user(self.host.clone(), self.port, credentials);
        config.management.port = self.management_port;
        config
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a port number, got {value:?}")))
}
