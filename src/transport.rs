//! Abstraction over the broker client library.
//!
//! The wire protocol is spoken by an underlying client library; this module
//! defines the seam the manager drives it through. A [`Connector`] opens a
//! [`Transport`] and reports its lifecycle callbacks through an
//! [`EventSink`], which turns them into messages for the owning manager.
//!
//! 代理客户端库的抽象。
//!
//! 线路协议由底层客户端库实现；此模块定义了管理器驱动它的接口。
//! [`Connector`] 打开一个 [`Transport`]，并通过 [`EventSink`] 报告其生命周期回调，
//! 这些回调被转换为发往所属管理器的消息。

use crate::{config::ConnectionConfig, error::Result, state::NativePhase};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use tokio::sync::mpsc;

/// Lifecycle callbacks a transport reports after it has been created.
///
/// 传输创建后报告的生命周期回调。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection reached the open phase.
    /// 连接到达打开阶段。
    Opened,
    /// The connection could not be opened.
    /// 连接无法打开。
    OpenFailed(String),
    /// The connection closed, gracefully (`None`) or with an error.
    /// 连接已关闭，正常关闭为 `None`，否则携带错误原因。
    Closed(Option<String>),
}

/// The sending half handed to a transport for its callbacks.
///
/// Every sink is tagged with the generation of the transport it belongs to,
/// so the manager can discard callbacks from a transport it has already
/// replaced. Sending never blocks and is safe from any thread.
///
/// 交给传输用于回调的发送端。
///
/// 每个发送端都带有其所属传输的代数标记，使管理器能够丢弃已被替换的传输的回调。
/// 发送从不阻塞，且可以在任意线程中调用。
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, TransportEvent)>) -> Self {
        Self { generation, tx }
    }

    /// Reports that the connection is open.
    pub fn opened(&self) {
        self.emit(TransportEvent::Opened);
    }

    /// Reports that the connection attempt failed.
    pub fn open_failed(&self, reason: impl Into<String>) {
        self.emit(TransportEvent::OpenFailed(reason.into()));
    }

    /// Reports that the connection closed.
    pub fn closed(&self, reason: Option<String>) {
        self.emit(TransportEvent::Closed(reason));
    }

    /// Returns `false` once the manager has gone away.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }
}

/// Opens transports to a broker.
///
/// 打开到代理的传输。
#[async_trait]
pub trait Connector: Send + Sync + Debug + 'static {
    /// Starts a connection attempt and returns its handle immediately.
    ///
    /// The attempt completes later: the transport reports `Opened` or
    /// `OpenFailed`, and eventually `Closed`, through `events`.
    ///
    /// 开始一次连接尝试并立即返回其句柄。尝试稍后通过 `events` 报告结果。
    async fn connect(
        &self,
        config: &ConnectionConfig,
        events: EventSink,
    ) -> Result<Box<dyn Transport>>;
}

/// A live connection handle owned by one manager.
///
/// 由单个管理器拥有的活动连接句柄。
#[async_trait]
pub trait Transport: Send + Sync + Debug + 'static {
    /// The client library's current phase code.
    fn phase(&self) -> NativePhase;

    /// Opens a channel over this connection. Only valid while open.
    ///
    /// 在此连接上打开一个通道。仅在连接打开时有效。
    async fn open_channel(&self) -> Result<Box<dyn Channel>>;

    /// Closes the connection. Best effort; the transport still reports `Closed`.
    ///
    /// 关闭连接。尽力而为；传输仍会报告 `Closed`。
    async fn close(&self);
}

/// A logical session multiplexed over an open transport.
pub trait Channel: Send + Sync + Debug + 'static {
    fn info(&self) -> ChannelInfo;
}

/// Introspection data for an open channel.
///
/// 已打开通道的内省数据。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    #[serde(rename = "Channel-Number")]
    pub channel_number: u16,
    #[serde(rename = "Flow-Active")]
    pub flow_active: bool,
    #[serde(rename = "Consumer-Tags")]
    pub consumer_tags: Vec<String>,
}
