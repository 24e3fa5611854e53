//! アプリ（プロセス）定義

use super::env::{EnvMap, env_map_to_json};
use super::logs::LogSinks;
use super::restart::RestartPolicy;
use super::units::{ExecMode, HumanDuration, Instances, MemorySize};
use super::watch::{WatchPolicy, WatchSetting};
use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 環境プロファイルのキー接頭辞（`env_production` など）
pub const ENV_PROFILE_PREFIX: &str = "env_";

/// アプリ定義
///
/// KDL形式：
/// ```kdl
/// app "api" {
///     script "./dist/index.js"
///     instances "max"
///     exec_mode "cluster"
///     env {
///         NODE_ENV "production"
///         PORT 5000
///     }
///     env "staging" {
///         NODE_ENV "staging"
///     }
///     restart {
///         max_restarts 10
///         min_uptime "60s"
///     }
///     logs {
///         out_file "./logs/out.log"
///     }
/// }
/// ```
///
/// JSON/YAML ではスーパーバイザーのフラットなキー名（`exec_mode`, `env_production` ...）を使う。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AppWire", into = "AppWire")]
pub struct App {
    pub name: String,
    /// エントリースクリプト（ビルド成果物）
    pub script: PathBuf,
    pub instances: Option<Instances>,
    pub exec_mode: Option<ExecMode>,
    /// 常に適用される環境変数
    pub env: EnvMap,
    /// 名前付き環境プロファイル（起動時に選択）
    pub env_profiles: BTreeMap<String, EnvMap>,
    pub restart: RestartPolicy,
    pub logs: LogSinks,
    pub watch: WatchPolicy,
    pub monitoring: Monitoring,
    /// 未知のキー（出力時にそのまま書き戻す）
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 監視設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitoring {
    /// 監視エージェントを有効にするか
    pub pmx: Option<bool>,
    /// 起動直後にヘルスチェックを猶予する時間（ミリ秒）
    pub health_check_grace_period: Option<u64>,
}

impl App {
    pub fn new(name: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            ..Default::default()
        }
    }

    /// 実行モード（未指定で instances があれば cluster）
    pub fn effective_exec_mode(&self) -> ExecMode {
        match (self.exec_mode, self.instances) {
            (Some(mode), _) => mode,
            (None, Some(_)) => ExecMode::Cluster,
            (None, None) => ExecMode::Fork,
        }
    }

    /// 起動するインスタンス数
    pub fn instance_count(&self, available_cpus: usize) -> usize {
        if self.effective_exec_mode() == ExecMode::Fork {
            return 1;
        }
        self.instances.unwrap_or_default().resolve(available_cpus)
    }

    /// 環境変数を解決
    ///
    /// ベースの `env` にプロファイルの値を上書きする。
    pub fn resolve_env(&self, profile: Option<&str>) -> Result<BTreeMap<String, String>> {
        let mut resolved: BTreeMap<String, String> = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();

        if let Some(profile) = profile {
            let overrides = self.env_profiles.get(profile).ok_or_else(|| {
                FlowError::EnvironmentNotFound(format!("{}.env_{}", self.name, profile))
            })?;
            for (key, value) in overrides {
                resolved.insert(key.clone(), value.to_string());
            }
        }

        Ok(resolved)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.pmx.unwrap_or(true)
    }
}

/// JSON/YAML 上のフラットな表現
#[derive(Serialize, Deserialize)]
struct AppWire {
    name: String,
    script: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instances: Option<Instances>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exec_mode: Option<ExecMode>,
    #[serde(default, skip_serializing_if = "EnvMap::is_empty")]
    env: EnvMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    out_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log_date_format: Option<String>,
    #[serde(default, alias = "combine_logs", skip_serializing_if = "Option::is_none")]
    merge_logs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_memory_restart: Option<MemorySize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    watch: Option<WatchSetting>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ignore_watch: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    restart_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_restarts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_uptime: Option<HumanDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    autorestart: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kill_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    listen_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pmx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    health_check_grace_period: Option<u64>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<AppWire> for App {
    type Error = FlowError;

    fn try_from(wire: AppWire) -> Result<Self> {
        let mut env_profiles = BTreeMap::new();
        let mut extra = BTreeMap::new();

        for (key, value) in wire.rest {
            match key.strip_prefix(ENV_PROFILE_PREFIX) {
                Some(profile) if !profile.is_empty() => {
                    let env: EnvMap =
                        serde_json::from_value(value).map_err(|e| FlowError::InvalidField {
                            owner: format!("app \"{}\"", wire.name),
                            field: key.clone(),
                            message: e.to_string(),
                        })?;
                    env_profiles.insert(profile.to_string(), env);
                }
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        Ok(App {
            name: wire.name,
            script: wire.script,
            instances: wire.instances,
            exec_mode: wire.exec_mode,
            env: wire.env,
            env_profiles,
            restart: RestartPolicy {
                autorestart: wire.autorestart,
                max_restarts: wire.max_restarts,
                min_uptime: wire.min_uptime,
                restart_delay: wire.restart_delay,
                kill_timeout: wire.kill_timeout,
                listen_timeout: wire.listen_timeout,
                max_memory_restart: wire.max_memory_restart,
            },
            logs: LogSinks {
                error_file: wire.error_file,
                out_file: wire.out_file,
                log_file: wire.log_file,
                time: wire.time,
                log_date_format: wire.log_date_format,
                merge_logs: wire.merge_logs,
            },
            watch: WatchPolicy {
                watch: wire.watch,
                ignore_watch: wire.ignore_watch,
            },
            monitoring: Monitoring {
                pmx: wire.pmx,
                health_check_grace_period: wire.health_check_grace_period,
            },
            extra,
        })
    }
}

impl From<App> for AppWire {
    fn from(app: App) -> Self {
        let mut rest = app.extra;
        for (profile, env) in &app.env_profiles {
            rest.insert(
                format!("{}{}", ENV_PROFILE_PREFIX, profile),
                env_map_to_json(env),
            );
        }

        AppWire {
            name: app.name,
            script: app.script,
            instances: app.instances,
            exec_mode: app.exec_mode,
            env: app.env,
            error_file: app.logs.error_file,
            out_file: app.logs.out_file,
            log_file: app.logs.log_file,
            time: app.logs.time,
            log_date_format: app.logs.log_date_format,
            merge_logs: app.logs.merge_logs,
            max_memory_restart: app.restart.max_memory_restart,
            watch: app.watch.watch,
            ignore_watch: app.watch.ignore_watch,
            restart_delay: app.restart.restart_delay,
            max_restarts: app.restart.max_restarts,
            min_uptime: app.restart.min_uptime,
            autorestart: app.restart.autorestart,
            kill_timeout: app.restart.kill_timeout,
            listen_timeout: app.restart.listen_timeout,
            pmx: app.monitoring.pmx,
            health_check_grace_period: app.monitoring.health_check_grace_period,
            rest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnvValue;

    #[test]
    fn test_effective_exec_mode() {
        let mut app = App::new("api", "./index.js");
        assert_eq!(app.effective_exec_mode(), ExecMode::Fork);

        app.instances = Some(Instances::Count(4));
        assert_eq!(app.effective_exec_mode(), ExecMode::Cluster);

        app.exec_mode = Some(ExecMode::Fork);
        assert_eq!(app.effective_exec_mode(), ExecMode::Fork);
        assert_eq!(app.instance_count(8), 1);
    }

    #[test]
    fn test_instance_count_max() {
        let mut app = App::new("api", "./index.js");
        app.instances = Some(Instances::Max);
        app.exec_mode = Some(ExecMode::Cluster);
        assert_eq!(app.instance_count(4), 4);
    }

    #[test]
    fn test_resolve_env_profile_overrides_base() {
        let mut app = App::new("api", "./index.js");
        app.env.insert("NODE_ENV".to_string(), EnvValue::from("development"));
        app.env.insert("PORT".to_string(), EnvValue::Integer(3000));
        let mut production = EnvMap::new();
        production.insert("NODE_ENV".to_string(), EnvValue::from("production"));
        app.env_profiles.insert("production".to_string(), production);

        let base = app.resolve_env(None).unwrap();
        assert_eq!(base["NODE_ENV"], "development");
        assert_eq!(base["PORT"], "3000");

        let prod = app.resolve_env(Some("production")).unwrap();
        assert_eq!(prod["NODE_ENV"], "production");
        assert_eq!(prod["PORT"], "3000");
    }

    #[test]
    fn test_resolve_env_unknown_profile() {
        let app = App::new("api", "./index.js");
        let result = app.resolve_env(Some("staging"));
        assert!(matches!(result, Err(FlowError::EnvironmentNotFound(_))));
    }

    #[test]
    fn test_wire_collects_profiles_and_extra() {
        let app: App = serde_json::from_str(
            r#"{
                "name": "api",
                "script": "./index.js",
                "env_production": {"NODE_ENV": "production"},
                "node_args": "--max-old-space-size=512"
            }"#,
        )
        .unwrap();

        assert_eq!(
            app.env_profiles["production"]["NODE_ENV"],
            EnvValue::from("production")
        );
        assert_eq!(
            app.extra["node_args"],
            serde_json::Value::String("--max-old-space-size=512".to_string())
        );

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["env_production"]["NODE_ENV"], "production");
        assert_eq!(json["node_args"], "--max-old-space-size=512");
    }

    #[test]
    fn test_wire_rejects_negative_timeout() {
        let result = serde_json::from_str::<App>(
            r#"{"name": "api", "script": "./index.js", "kill_timeout": -1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_wire_rejects_unknown_exec_mode() {
        let result = serde_json::from_str::<App>(
            r#"{"name": "api", "script": "./index.js", "exec_mode": "thread"}"#,
        );
        assert!(result.is_err());
    }
}
