//! エコシステム（設定ファイル全体）定義

use super::app::App;
use super::deploy::DeployTarget;
use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 設定ファイル全体
///
/// スーパーバイザーが起動時に一度だけ読み込む静的な設定。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ecosystem {
    /// 起動するアプリ（宣言順）
    #[serde(default)]
    pub apps: Vec<App>,
    /// 環境名 → デプロイ先
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deploy: BTreeMap<String, DeployTarget>,
}

impl Ecosystem {
    /// 名前でアプリを取得
    pub fn app(&self, name: &str) -> Result<&App> {
        self.apps
            .iter()
            .find(|app| app.name == name)
            .ok_or_else(|| FlowError::AppNotFound(name.to_string()))
    }

    /// 環境名でデプロイ先を取得
    pub fn deploy_target(&self, environment: &str) -> Result<&DeployTarget> {
        self.deploy
            .get(environment)
            .ok_or_else(|| FlowError::EnvironmentNotFound(environment.to_string()))
    }

    /// 全アプリで定義されている環境プロファイル名
    pub fn env_profiles(&self) -> Vec<&str> {
        let mut profiles: Vec<&str> = self
            .apps
            .iter()
            .flat_map(|app| app.env_profiles.keys().map(|k| k.as_str()))
            .collect();
        profiles.sort_unstable();
        profiles.dedup();
        profiles
    }
}
