//! Request-level operations behind the HTTP surface.
//!
//! The gateway validates input, resolves managers by id, applies the
//! permission policy and turns failures into [`ErrorBody`] payloads with an
//! HTTP status. Routing and serving are left to the embedding application.
//!
//! HTTP 接口背后的请求级操作。
//!
//! 网关负责验证输入、按ID解析管理器、应用权限策略，并将失败转换为带HTTP状态码的
//! [`ErrorBody`]。路由和服务由嵌入的应用程序负责。

use crate::{
    config::{BrokerSettings, Credentials},
    error::{Error, Result},
    manager::{ConnectionManager, ManagerId},
    permission::{AllowAll, Permission, PermissionPolicy},
    registry::ManagerRegistry,
    state::ConnectionState,
    topology::{Exchange, Queue},
    transport::Connector,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub id: ManagerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    #[serde(rename = "connectionStatus")]
    pub connection_status: ConnectionState,
}

const SERVER_ERROR: &str = "Server Error";

/// Failure payload: `{"Error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "Error")]
    pub error: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// The request boundary: owns the registry and creates managers on login.
///
/// 请求边界：拥有注册表并在登录时创建管理器。
#[derive(Debug, Clone)]
pub struct Gateway {
    registry: ManagerRegistry,
    settings: BrokerSettings,
    connector: Arc<dyn Connector>,
    policy: Arc<dyn PermissionPolicy>,
}

impl Gateway {
    /// Creates a gateway that permits every operation.
    pub fn new(settings: BrokerSettings, connector: Arc<dyn Connector>) -> Self {
        Self::with_policy(settings, connector, Arc::new(AllowAll))
    }

    pub fn with_policy(
        settings: BrokerSettings,
        connector: Arc<dyn Connector>,
        policy: Arc<dyn PermissionPolicy>,
    ) -> Self {
        Self {
            registry: ManagerRegistry::new(),
            settings,
            connector,
            policy,
        }
    }

    pub fn registry(&self) -> &ManagerRegistry {
        &self.registry
    }

    /// Creates a manager for the given user and starts connecting it.
    ///
    /// The connection attempt runs in the background; the id is returned
    /// before the outcome is known.
    ///
    /// 为给定用户创建管理器并开始连接。连接尝试在后台进行，结果未知时即返回ID。
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let (Some(username), Some(password)) = (
            request.username.filter(|u| !u.is_empty()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(Error::BadRequest("invalid data".to_string()));
        };

        let config = self
            .settings
            .config_for(Credentials::new(username.clone(), password));
        let manager = ConnectionManager::new(config, self.connector.clone())?;
        manager.initialize().await?;
        let id = self.registry.insert(manager);

        info!(manager_id = %id, username = %username, "User logged in");
        Ok(LoginResponse { id })
    }

    pub async fn status(&self, id: &str) -> Result<StatusResponse> {
        let manager = self.registry.get(id)?;
        Ok(StatusResponse {
            connection_status: manager.current_state().await?,
        })
    }

    pub async fn exchanges(&self, id: &str) -> Result<Option<Vec<Exchange>>> {
        let manager = self.authorize(id, Permission::ExchangeRead)?;
        manager.exchanges().await
    }

    pub async fn queues(&self, id: &str) -> Result<Option<Vec<Queue>>> {
        let manager = self.authorize(id, Permission::QueueRead)?;
        manager.queues().await
    }

    /// Shuts every registered manager down.
    pub fn shutdown(&self) {
        self.registry.shutdown_all();
    }

    /// Maps a failed operation to its HTTP status and payload.
    ///
    /// Server-side failures are logged in full and answered with a generic
    /// message.
    ///
    /// 将失败的操作映射为HTTP状态码和响应体。服务端错误只记录日志，响应中使用通用消息。
    pub fn reject(err: &Error) -> (u16, ErrorBody) {
        let status = err.status_code();
        if status >= 500 {
            error!(error = %err, "Request failed");
            return (
                status,
                ErrorBody {
                    error: SERVER_ERROR.to_string(),
                },
            );
        }
        (status, ErrorBody::from(err))
    }

    fn authorize(&self, id: &str, permission: Permission) -> Result<ConnectionManager> {
        let manager = self.registry.get(id)?;
        if self.policy.check(&manager, permission)? {
            Ok(manager)
        } else {
            info!(manager_id = %manager.id(), %permission, "Permission denied");
            Err(Error::Forbidden)
        }
    }
}
