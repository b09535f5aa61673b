//! The actor that owns one broker connection and drives its recovery.
//!
//! 拥有单个代理连接并驱动其恢复的 actor。

use super::{command::ManagerCommand, ManagerId, ReconnectStatus};
use crate::{
    backoff::ReconnectBackoff,
    config::Config,
    error::{Error, Result},
    state::ConnectionState,
    transport::{Channel, ChannelInfo, Connector, EventSink, Transport, TransportEvent},
};
use std::{future, pin::Pin, sync::Arc};
use tokio::{
    sync::mpsc,
    time::{sleep, Sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns the transport, the channel and the backoff state of one manager.
///
/// All lifecycle callbacks arrive as messages on `event_rx`, so every
/// mutation happens on this task and needs no locking. At most one
/// reconnection wait is armed at any time.
///
/// 拥有单个管理器的传输、通道和退避状态。
///
/// 所有生命周期回调都作为消息到达 `event_rx`，因此所有修改都发生在此任务上，无需加锁。
/// 任何时刻最多只有一个重连等待处于激活状态。
pub(crate) struct ManagerActor {
    pub(crate) id: ManagerId,
    pub(crate) config: Arc<Config>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) transport: Option<Box<dyn Transport>>,
    pub(crate) channel: Option<Box<dyn Channel>>,
    /// Generation of the current transport; 0 before the first initialize.
    pub(crate) generation: u64,
    pub(crate) backoff: ReconnectBackoff,
    pub(crate) reconnect: Option<Pin<Box<Sleep>>>,
    pub(crate) command_rx: mpsc::Receiver<ManagerCommand>,
    pub(crate) event_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    pub(crate) event_rx: mpsc::UnboundedReceiver<(u64, TransportEvent)>,
    pub(crate) shutdown: CancellationToken,
}

impl ManagerActor {
    /// Runs the actor's main event loop until shutdown or until every handle is gone.
    ///
    /// 运行 actor 的主事件循环，直到关闭或所有句柄都被丢弃。
    pub(crate) async fn run(mut self) {
        debug!(manager_id = %self.id, "Manager actor started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    break;
                }
                // Callbacks first, so a query sees every event emitted before it.
                Some((generation, event)) = self.event_rx.recv() => {
                    self.handle_event(generation, event).await;
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                _ = reconnect_elapsed(&mut self.reconnect), if self.reconnect.is_some() => {
                    self.reconnect = None;
                    self.backoff.settle();
                    info!(manager_id = %self.id, "Reconnecting");
                    self.connect().await;
                }
            }
        }

        self.teardown().await;
    }

    async fn handle_command(&mut self, command: ManagerCommand) {
        match command {
            ManagerCommand::Initialize => {
                if self.reconnect.take().is_some() {
                    debug!(manager_id = %self.id, "Explicit initialize disarmed pending reconnection");
                }
                self.connect().await;
            }
            ManagerCommand::CurrentState { response_tx } => {
                let _ = response_tx.send(self.current_state());
            }
            ManagerCommand::ChannelInfo { response_tx } => {
                let _ = response_tx.send(self.channel_info());
            }
            ManagerCommand::ReconnectStatus { response_tx } => {
                let _ = response_tx.send(ReconnectStatus {
                    scheduled: self.backoff.scheduled(),
                    stored_units: self.backoff.stored_units(),
                    pending: self.reconnect.is_some(),
                });
            }
        }
    }

    /// Opens a new transport, closing whatever was there before.
    ///
    /// The attempt's outcome is reported later through the event sink.
    ///
    /// 打开一个新的传输并关闭之前的传输。尝试结果稍后通过事件发送端报告。
    async fn connect(&mut self) {
        self.channel = None;
        self.generation += 1;
        if let Some(previous) = self.transport.take() {
            debug!(manager_id = %self.id, "Closing superseded transport");
            previous.close().await;
        }

        let sink = EventSink::new(self.generation, self.event_tx.clone());
        info!(
            manager_id = %self.id,
            host = %self.config.connection.host,
            port = self.config.connection.port,
            generation = self.generation,
            "Opening connection"
        );
        match self.connector.connect(&self.config.connection, sink).await {
            Ok(transport) => self.transport = Some(transport),
            Err(e) => self.on_open_error(e.to_string()),
        }
    }

    async fn handle_event(&mut self, generation: u64, event: TransportEvent) {
        if generation != self.generation {
            debug!(
                manager_id = %self.id,
                generation,
                current = self.generation,
                ?event,
                "Ignoring event from superseded transport"
            );
            return;
        }

        match event {
            TransportEvent::Opened => self.on_open().await,
            TransportEvent::OpenFailed(reason) => self.on_open_error(reason),
            TransportEvent::Closed(reason) => self.on_close(reason),
        }
    }

    async fn on_open(&mut self) {
        info!(manager_id = %self.id, "Connection opened");
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        match transport.open_channel().await {
            Ok(channel) => {
                debug!(
                    manager_id = %self.id,
                    channel_number = channel.info().channel_number,
                    "Channel opened"
                );
                self.channel = Some(channel);
            }
            Err(e) => warn!(manager_id = %self.id, error = %e, "Failed to open channel"),
        }
    }

    /// An open error alone never schedules a retry; only a close does.
    fn on_open_error(&self, reason: String) {
        warn!(manager_id = %self.id, reason = %reason, "Connection open failed");
    }

    fn on_close(&mut self, reason: Option<String>) {
        self.channel = None;
        match &reason {
            Some(reason) => warn!(manager_id = %self.id, reason = %reason, "Connection closed"),
            None => info!(manager_id = %self.id, "Connection closed"),
        }

        if self.reconnect.is_some() {
            debug!(manager_id = %self.id, "Reconnection already pending");
            return;
        }

        match self.backoff.schedule() {
            Some(delay) => {
                info!(
                    manager_id = %self.id,
                    attempt = self.backoff.scheduled(),
                    delay_secs = delay.as_secs_f32(),
                    "Reconnecting in {} seconds",
                    delay.as_secs_f32()
                );
                self.reconnect = Some(Box::pin(sleep(delay)));
            }
            None => warn!(
                manager_id = %self.id,
                scheduled = self.backoff.scheduled(),
                "Reconnection budget exhausted, staying closed"
            ),
        }
    }

    fn current_state(&self) -> Result<ConnectionState> {
        match &self.transport {
            Some(transport) => ConnectionState::from_native(transport.phase()),
            None if self.generation > 0 => Ok(ConnectionState::Closed),
            None => Err(Error::NotInitialized),
        }
    }

    fn channel_info(&self) -> Result<ChannelInfo> {
        let open = self
            .transport
            .as_ref()
            .and_then(|t| ConnectionState::from_native(t.phase()).ok())
            .is_some_and(|state| state.is_open());
        match &self.channel {
            Some(channel) if open => Ok(channel.info()),
            _ => Err(Error::NoChannel),
        }
    }

    async fn teardown(&mut self) {
        self.reconnect = None;
        self.channel = None;
        if let Some(transport) = self.transport.take() {
            transport.close().await;
        }
        info!(manager_id = %self.id, "Manager stopped");
    }
}

async fn reconnect_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(timer) => timer.as_mut().await,
        None => future::pending().await,
    }
}
