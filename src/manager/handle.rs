//! The user-facing handle to a manager actor.

use super::{actor::ManagerActor, command::ManagerCommand, ManagerId, ReconnectStatus};
use crate::{
    backoff::ReconnectBackoff,
    config::Config,
    error::{Error, Result},
    state::ConnectionState,
    topology::{Exchange, Queue, TopologyClient},
    transport::{ChannelInfo, Connector},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A handle to one supervised broker connection.
///
/// Cloning the handle is cheap; every clone talks to the same actor.
///
/// 单个受监管代理连接的句柄。克隆代价很低，所有克隆都与同一个 actor 通信。
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    id: ManagerId,
    command_tx: mpsc::Sender<ManagerCommand>,
    shutdown: CancellationToken,
    topology: Arc<TopologyClient>,
}

impl ConnectionManager {
    /// Creates a manager and spawns its actor. No connection is made until
    /// [`ConnectionManager::initialize`] is called.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// 创建管理器并启动其 actor。在调用 `initialize` 之前不会建立连接。
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Result<Self> {
        let id = ManagerId::new();
        let topology = Arc::new(TopologyClient::new(&config.connection, &config.management)?);

        let (command_tx, command_rx) = mpsc::channel(128);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let actor = ManagerActor {
            id,
            backoff: ReconnectBackoff::new(&config.reconnect),
            config: Arc::new(config),
            connector,
            transport: None,
            channel: None,
            generation: 0,
            reconnect: None,
            command_rx,
            event_tx,
            event_rx,
            shutdown: shutdown.clone(),
        };
        tokio::spawn(actor.run());

        info!(manager_id = %id, "Connection manager created");
        Ok(Self {
            id,
            command_tx,
            shutdown,
            topology,
        })
    }

    /// The manager's immutable identity.
    pub fn id(&self) -> ManagerId {
        self.id
    }

    /// Asks the manager to open a fresh connection.
    ///
    /// Returns as soon as the request is queued; poll
    /// [`ConnectionManager::current_state`] to observe the outcome.
    ///
    /// 请求管理器打开新的连接。请求入队后立即返回。
    pub async fn initialize(&self) -> Result<()> {
        self.command_tx
            .send(ManagerCommand::Initialize)
            .await
            .map_err(|_| Error::ManagerClosed)
    }

    /// The public state of the current connection.
    ///
    /// 当前连接的公开状态。
    pub async fn current_state(&self) -> Result<ConnectionState> {
        self.request(|response_tx| ManagerCommand::CurrentState { response_tx })
            .await?
    }

    /// Details of the channel opened over the current connection.
    pub async fn channel_info(&self) -> Result<ChannelInfo> {
        self.request(|response_tx| ManagerCommand::ChannelInfo { response_tx })
            .await?
    }

    pub async fn reconnect_status(&self) -> Result<ReconnectStatus> {
        self.request(|response_tx| ManagerCommand::ReconnectStatus { response_tx })
            .await
    }

    /// Lists the broker's exchanges; `None` if the management API refused.
    pub async fn exchanges(&self) -> Result<Option<Vec<Exchange>>> {
        self.topology.exchanges().await
    }

    /// Lists the broker's queues; `None` if the management API refused.
    pub async fn queues(&self) -> Result<Option<Vec<Queue>>> {
        self.topology.queues().await
    }

    /// Stops the actor: closes the connection and cancels any pending reconnection.
    ///
    /// 停止 actor：关闭连接并取消任何待处理的重连。
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ManagerCommand,
    ) -> Result<T> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(make(response_tx))
            .await
            .map_err(|_| Error::ManagerClosed)?;
        response_rx.await.map_err(|_| Error::ManagerClosed)
    }
}
