//! 再起動ポリシー定義

use super::units::{HumanDuration, MemorySize};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_RESTARTS: u32 = 16;
pub const DEFAULT_MIN_UPTIME_MS: u64 = 1_000;
pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 1_600;
pub const DEFAULT_LISTEN_TIMEOUT_MS: u64 = 3_000;

/// 再起動ポリシー
///
/// 設定ファイルに書かれた値をそのまま保持する（未指定は None）。
/// スーパーバイザーのデフォルトを適用した値は [`RestartPolicy::resolved`] で得る。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// クラッシュ時に自動再起動するか
    pub autorestart: Option<bool>,
    /// 不安定な再起動の上限回数
    pub max_restarts: Option<u32>,
    /// これより短い稼働時間での終了は不安定な再起動として数える
    pub min_uptime: Option<HumanDuration>,
    /// 再起動までの待ち時間（ミリ秒）
    pub restart_delay: Option<u64>,
    /// SIGINT から SIGKILL までの猶予（ミリ秒）
    pub kill_timeout: Option<u64>,
    /// listen 待ちのタイムアウト（ミリ秒）
    pub listen_timeout: Option<u64>,
    /// このメモリ使用量を超えたら再起動
    pub max_memory_restart: Option<MemorySize>,
}

/// デフォルト適用済みの再起動ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRestartPolicy {
    pub autorestart: bool,
    pub max_restarts: u32,
    pub min_uptime: Duration,
    pub restart_delay: Duration,
    pub kill_timeout: Duration,
    pub listen_timeout: Duration,
    pub max_memory_bytes: Option<u64>,
}

impl RestartPolicy {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn resolved(&self) -> ResolvedRestartPolicy {
        ResolvedRestartPolicy {
            autorestart: self.autorestart.unwrap_or(true),
            max_restarts: self.max_restarts.unwrap_or(DEFAULT_MAX_RESTARTS),
            min_uptime: self
                .min_uptime
                .map(|d| d.as_duration())
                .unwrap_or(Duration::from_millis(DEFAULT_MIN_UPTIME_MS)),
            restart_delay: Duration::from_millis(self.restart_delay.unwrap_or(0)),
            kill_timeout: Duration::from_millis(
                self.kill_timeout.unwrap_or(DEFAULT_KILL_TIMEOUT_MS),
            ),
            listen_timeout: Duration::from_millis(
                self.listen_timeout.unwrap_or(DEFAULT_LISTEN_TIMEOUT_MS),
            ),
            max_memory_bytes: self.max_memory_restart.map(|s| s.as_bytes()),
        }
    }
}

impl ResolvedRestartPolicy {
    /// メモリ使用量が閾値を超えているか
    pub fn exceeds_memory(&self, rss_bytes: u64) -> bool {
        self.max_memory_bytes
            .is_some_and(|limit| rss_bytes > limit)
    }
}
