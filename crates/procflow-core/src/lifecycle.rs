//! 再起動判定
//!
//! スーパーバイザーがプロセス終了時に下す判断を、設定の再起動ポリシーから計算する。
//! プロセスの起動・監視そのものは行わない。

use crate::model::ResolvedRestartPolicy;
use std::time::Duration;
use tracing::{debug, warn};

/// プロセス終了時の判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// delay 後に再起動
    Restart { delay: Duration },
    /// autorestart が無効なので停止したままにする
    Stop,
    /// 不安定な再起動が上限を超えた（以降も再起動しない）
    GiveUp,
}

/// トラッカーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Online,
    Stopped,
    Errored,
}

/// 1インスタンス分の再起動カウンタ
#[derive(Debug, Clone)]
pub struct RestartTracker {
    policy: ResolvedRestartPolicy,
    unstable_restarts: u32,
    total_restarts: u64,
    state: TrackerState,
}

impl RestartTracker {
    pub fn new(policy: ResolvedRestartPolicy) -> Self {
        Self {
            policy,
            unstable_restarts: 0,
            total_restarts: 0,
            state: TrackerState::Online,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn unstable_restarts(&self) -> u32 {
        self.unstable_restarts
    }

    pub fn total_restarts(&self) -> u64 {
        self.total_restarts
    }

    /// プロセスが終了した
    ///
    /// min_uptime 未満での終了は不安定な再起動として数え、max_restarts を超えたら
    /// 以降は常に GiveUp を返す。min_uptime 以上稼働していればカウンタをリセットする。
    pub fn on_exit(&mut self, uptime: Duration) -> RestartDecision {
        if self.state == TrackerState::Errored {
            return RestartDecision::GiveUp;
        }
        if !self.policy.autorestart {
            self.state = TrackerState::Stopped;
            return RestartDecision::Stop;
        }

        if uptime < self.policy.min_uptime {
            self.unstable_restarts += 1;
            debug!(
                unstable_restarts = self.unstable_restarts,
                uptime_ms = uptime.as_millis() as u64,
                "Unstable exit"
            );
            if self.unstable_restarts > self.policy.max_restarts {
                warn!(
                    max_restarts = self.policy.max_restarts,
                    "Too many unstable restarts, giving up"
                );
                self.state = TrackerState::Errored;
                return RestartDecision::GiveUp;
            }
        } else {
            self.unstable_restarts = 0;
        }

        self.total_restarts += 1;
        self.state = TrackerState::Online;
        RestartDecision::Restart {
            delay: self.policy.restart_delay,
        }
    }

    /// メモリ使用量のサンプル
    ///
    /// 閾値超過はクラッシュではないので不安定な再起動には数えず、待ち時間なしで再起動する。
    pub fn on_memory_sample(&mut self, rss_bytes: u64) -> Option<RestartDecision> {
        if self.state != TrackerState::Online || !self.policy.exceeds_memory(rss_bytes) {
            return None;
        }
        debug!(rss_bytes, "Memory threshold exceeded");
        self.total_restarts += 1;
        Some(RestartDecision::Restart {
            delay: Duration::ZERO,
        })
    }

    /// 手動の restart/reload でカウンタを戻す
    pub fn reset(&mut self) {
        self.unstable_restarts = 0;
        self.state = TrackerState::Online;
    }
}
