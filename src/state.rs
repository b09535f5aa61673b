//! Defines the public connection phases and their mapping from transport phases.
//!
//! 定义公开的连接阶段及其与传输原生阶段的映射。

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A phase code as reported by the underlying client library.
///
/// 底层客户端库报告的阶段代码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativePhase(pub u8);

impl NativePhase {
    pub const CLOSED: Self = Self(0);
    pub const INIT: Self = Self(1);
    pub const PROTOCOL: Self = Self(2);
    pub const START: Self = Self(3);
    pub const TUNE: Self = Self(4);
    pub const OPEN: Self = Self(5);
    pub const CLOSING: Self = Self(6);
}

/// The state of a managed connection.
/// 托管连接的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection; either never opened, dropped, or given up on.
    /// 无连接。
    Closed,
    /// The socket is being established.
    /// 正在建立套接字。
    Init,
    /// The protocol header has been sent.
    /// 已发送协议头。
    Protocol,
    /// The broker's start negotiation is in progress.
    /// 正在进行代理的启动协商。
    Start,
    /// Tuning parameters (frame size, heartbeat) are being negotiated.
    /// 正在协商调优参数。
    Tune,
    /// The connection is fully open.
    /// 连接已完全打开。
    Open,
    /// A close handshake is in progress.
    /// 正在进行关闭握手。
    Closing,
}

impl ConnectionState {
    /// Maps a native transport phase onto the public vocabulary.
    ///
    /// Any phase outside the fixed table fails with [`Error::UnsupportedState`].
    ///
    /// 将传输原生阶段映射到公开词汇表，表外的阶段返回错误。
    pub fn from_native(phase: NativePhase) -> Result<Self> {
        match phase {
            NativePhase::CLOSED => Ok(Self::Closed),
            NativePhase::INIT => Ok(Self::Init),
            NativePhase::PROTOCOL => Ok(Self::Protocol),
            NativePhase::START => Ok(Self::Start),
            NativePhase::TUNE => Ok(Self::Tune),
            NativePhase::OPEN => Ok(Self::Open),
            NativePhase::CLOSING => Ok(Self::Closing),
            NativePhase(other) => Err(Error::UnsupportedState(other)),
        }
    }

    /// The lowercase label used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Init => "init",
            Self::Protocol => "protocol",
            Self::Start => "start",
            Self::Tune => "tune",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl TryFrom<NativePhase> for ConnectionState {
    type Error = Error;

    fn try_from(phase: NativePhase) -> Result<Self> {
        Self::from_native(phase)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
