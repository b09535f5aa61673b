//! Commands used by the manager actor.

use super::ReconnectStatus;
use crate::{error::Result, state::ConnectionState, transport::ChannelInfo};
use tokio::sync::oneshot;

/// Commands sent from a `ConnectionManager` handle to its actor.
///
/// 从 `ConnectionManager` 句柄发送到其 actor 的命令。
#[derive(Debug)]
pub(crate) enum ManagerCommand {
    /// Open a new transport, superseding the current one.
    /// 打开一个新的传输，替换当前传输。
    Initialize,
    /// Read the public connection state.
    /// 读取公开的连接状态。
    CurrentState {
        response_tx: oneshot::Sender<Result<ConnectionState>>,
    },
    /// Read details of the open channel.
    /// 读取已打开通道的详细信息。
    ChannelInfo {
        response_tx: oneshot::Sender<Result<ChannelInfo>>,
    },
    /// Read the reconnection bookkeeping.
    /// 读取重连记录。
    ReconnectStatus {
        response_tx: oneshot::Sender<ReconnectStatus>,
    },
}
