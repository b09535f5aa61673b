//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the connection warden library.
/// 连接管理库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// The connection state was queried before the manager ever created a transport.
    /// 在管理器创建任何传输之前查询了连接状态。
    #[error("manager not initialized")]
    NotInitialized,

    /// The transport reported a native phase outside the fixed mapping table.
    /// This signals a client library/version mismatch and never happens in
    /// correct operation.
    ///
    /// 传输报告了固定映射表之外的原生阶段。这表示客户端库版本不匹配。
    #[error("state {0} not defined")]
    UnsupportedState(u8),

    /// A connection attempt failed before reaching the open phase.
    /// 连接尝试在到达打开阶段之前失败。
    #[error("connection failed: {0}")]
    TransportOpen(String),

    /// The management API answered with a non-success status.
    /// 管理API返回了非成功状态。
    #[error("management request failed: {status} - {reason}")]
    RemoteQuery { status: u16, reason: String },

    /// The management API request could not complete at all.
    /// 管理API请求根本无法完成。
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A successful management response carried an unexpected body.
    /// 成功的管理响应包含了意外的响应体。
    #[error("malformed management response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The permission gate rejected the operation.
    /// 权限检查拒绝了该操作。
    #[error("Access is denied")]
    Forbidden,

    /// No manager is registered under the given id.
    /// 没有以给定ID注册的管理器。
    #[error("Invalid id")]
    UnknownManager(String),

    /// A boundary request was missing required data.
    /// 边界请求缺少必需的数据。
    #[error("{0}")]
    BadRequest(String),

    /// Channel details were requested while no channel is open.
    /// 在没有打开通道时请求了通道信息。
    #[error("there is not any available channel")]
    NoChannel,

    /// The manager's actor has stopped, usually after `shutdown`.
    /// 管理器的 actor 已经停止，通常是在 `shutdown` 之后。
    #[error("manager has been shut down")]
    ManagerClosed,

    /// An environment value could not be turned into configuration.
    /// 环境变量无法转换为配置。
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The HTTP status a request boundary should answer with for this error.
    ///
    /// Unknown ids and malformed requests are client errors; everything
    /// else is a server error.
    ///
    /// 请求边界针对此错误应返回的HTTP状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) | Error::UnknownManager(_) => 400,
            Error::Forbidden => 403,
            _ => 500,
        }
    }
}
