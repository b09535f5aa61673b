//! Bounded linear backoff for connection recovery.
//!
//! 用于连接恢复的有界线性退避。
//!
//! # Algorithm
//!
//! The scheduler keeps a stored delay counter (starting at 0) and a count of
//! scheduled reconnections:
//!
//! ```text
//! schedule: stored = min(stored + 1, max_delay)   -> wait `stored` units
//! settle:   stored = stored + 1                   (after the wait elapsed)
//! ```
//!
//! A full schedule/settle cycle advances the stored counter by two, so the
//! waits run 1, 3, 5, ... up to the ceiling and then stay there. Nothing ever
//! resets the counter; a successful connection keeps the accumulated delay.

use crate::config::ReconnectConfig;
use std::time::Duration;

/// Reconnection delay calculator and attempt budget for one manager.
///
/// 单个管理器的重连延迟计算器和尝试预算。
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    /// The duration of one delay unit.
    unit: Duration,
    /// Ceiling of the delay, in units.
    max_delay_units: u32,
    /// Scheduling budget; 0 means unlimited.
    max_reconnections: u32,
    /// Stored delay counter, in units.
    stored_units: u32,
    /// Reconnections scheduled so far.
    scheduled: u32,
}

impl ReconnectBackoff {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            unit: config.delay_unit,
            max_delay_units: config.max_delay_units,
            max_reconnections: config.max_reconnections,
            stored_units: 0,
            scheduled: 0,
        }
    }

    /// Whether the budget still allows another reconnection.
    ///
    /// 预算是否仍允许再一次重连。
    pub fn can_schedule(&self) -> bool {
        self.max_reconnections == 0 || self.scheduled < self.max_reconnections
    }

    /// Consumes one reconnection from the budget and returns how long to wait
    /// before it, or `None` when the budget is spent.
    ///
    /// 从预算中消耗一次重连并返回等待时长；预算耗尽时返回 `None`。
    pub fn schedule(&mut self) -> Option<Duration> {
        if !self.can_schedule() {
            return None;
        }
        self.scheduled += 1;
        self.stored_units = self
            .stored_units
            .saturating_add(1)
            .min(self.max_delay_units);
        Some(self.unit * self.stored_units)
    }

    /// Records that a scheduled wait has elapsed.
    ///
    /// 记录一次已调度的等待已经结束。
    pub fn settle(&mut self) {
        self.stored_units = self.stored_units.saturating_add(1);
    }

    /// Reconnections scheduled so far.
    pub fn scheduled(&self) -> u32 {
        self.scheduled
    }

    /// The stored delay counter, in units.
    pub fn stored_units(&self) -> u32 {
        self.stored_units
    }
}
