//! app ノードのパース

use super::values::{Scope, is_list, node_to_json};
use crate::error::{FlowError, Result};
use crate::model::{App, ENV_PROFILE_PREFIX, ExecMode, Instances, MemorySize, WatchSetting};
use kdl::KdlNode;
use std::path::PathBuf;

/// app ノードをパース
///
/// スーパーバイザーのキーはフラットにも `restart {}` / `logs {}` / `monitoring {}`
/// のグループ内にも書ける。
pub fn parse_app(node: &KdlNode) -> Result<App> {
    let name = node
        .entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| FlowError::InvalidConfig("app requires a name".to_string()))?
        .to_string();

    let scope = Scope::new("app", &name);
    let mut app = App {
        name: name.clone(),
        ..Default::default()
    };
    let mut has_script = false;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "script" {
                has_script = true;
            }
            apply_app_key(&mut app, child, &scope)?;
        }
    }

    if !has_script {
        return Err(FlowError::InvalidField {
            owner: format!("app \"{}\"", name),
            field: "script".to_string(),
            message: "script が指定されていません".to_string(),
        });
    }

    Ok(app)
}

fn apply_app_key(app: &mut App, child: &KdlNode, scope: &Scope) -> Result<()> {
    match child.name().value() {
        "script" => {
            app.script = PathBuf::from(scope.string(child)?);
        }
        "instances" => {
            let value = scope.value(child)?;
            let instances = if let Some(s) = value.as_string() {
                Instances::parse(s)
            } else {
                value
                    .as_integer()
                    .and_then(|i| i64::try_from(i).ok())
                    .map(Instances::Count)
            };
            app.instances = Some(
                instances
                    .ok_or_else(|| scope.error(child, "整数または \"max\" を指定してください"))?,
            );
        }
        "exec_mode" => {
            let mode = scope.string(child)?;
            app.exec_mode = Some(ExecMode::parse(&mode).ok_or_else(|| {
                scope.error(
                    child,
                    format!("'{}' は不明です（fork または cluster）", mode),
                )
            })?);
        }
        // env { ... } はベース、env "production" { ... } はプロファイル
        "env" => {
            let profile = child
                .children()
                .and_then(|_| child.entries().first())
                .and_then(|e| e.value().as_string());
            let env = scope.env_map(child)?;
            match profile {
                Some(profile) => app
                    .env_profiles
                    .entry(profile.to_string())
                    .or_default()
                    .extend(env),
                None => app.env.extend(env),
            }
        }
        key if key.starts_with(ENV_PROFILE_PREFIX) && key.len() > ENV_PROFILE_PREFIX.len() => {
            let profile = &key[ENV_PROFILE_PREFIX.len()..];
            let env = scope.env_map(child)?;
            app.env_profiles
                .entry(profile.to_string())
                .or_default()
                .extend(env);
        }
        // グループ
        "restart" | "logs" | "monitoring" => {
            if let Some(children) = child.children() {
                for grandchild in children.nodes() {
                    apply_app_key(app, grandchild, scope)?;
                }
            }
        }
        "watch" => {
            // (list)watch はパス一覧（空でもよい）
            if is_list(child) {
                app.watch.watch = Some(WatchSetting::Paths(scope.strings(child)?));
            } else if let Some(value) = child.entries().iter().find(|e| e.name().is_none()) {
                app.watch.watch = Some(match value.value().as_bool() {
                    Some(enabled) => WatchSetting::Enabled(enabled),
                    None => WatchSetting::Paths(scope.strings(child)?),
                });
            }
            if let Some(children) = child.children() {
                for grandchild in children.nodes() {
                    match grandchild.name().value() {
                        "ignore" | "ignore_watch" => {
                            app.watch.ignore_watch.extend(scope.strings(grandchild)?);
                        }
                        _ => return Err(scope.error(grandchild, "watch 内では ignore のみ指定できます")),
                    }
                }
            }
        }
        "ignore_watch" => {
            app.watch.ignore_watch.extend(scope.strings(child)?);
        }
        // 再起動ポリシー
        "autorestart" => {
            app.restart.autorestart = Some(scope.bool(child)?);
        }
        "max_restarts" => {
            let max = u32::try_from(scope.unsigned(child)?)
                .map_err(|_| scope.error(child, "値が大きすぎます"))?;
            app.restart.max_restarts = Some(max);
        }
        "min_uptime" => {
            app.restart.min_uptime = Some(scope.duration(child)?);
        }
        "restart_delay" => {
            app.restart.restart_delay = Some(scope.millis(child)?);
        }
        "kill_timeout" => {
            app.restart.kill_timeout = Some(scope.millis(child)?);
        }
        "listen_timeout" => {
            app.restart.listen_timeout = Some(scope.millis(child)?);
        }
        "max_memory_restart" => {
            let value = scope.value(child)?;
            let size = match value.as_string() {
                Some(s) => MemorySize::parse(s).map_err(|e| scope.error(child, e.to_string()))?,
                None => MemorySize::from_bytes(scope.unsigned(child)?),
            };
            app.restart.max_memory_restart = Some(size);
        }
        // ログ
        "error_file" => {
            app.logs.error_file = Some(PathBuf::from(scope.string(child)?));
        }
        "out_file" => {
            app.logs.out_file = Some(PathBuf::from(scope.string(child)?));
        }
        "log_file" => {
            app.logs.log_file = Some(PathBuf::from(scope.string(child)?));
        }
        "time" => {
            app.logs.time = Some(scope.bool(child)?);
        }
        "log_date_format" => {
            app.logs.log_date_format = Some(scope.string(child)?);
        }
        "merge_logs" | "combine_logs" => {
            app.logs.merge_logs = Some(scope.bool(child)?);
        }
        // 監視
        "pmx" => {
            app.monitoring.pmx = Some(scope.bool(child)?);
        }
        "health_check_grace_period" => {
            app.monitoring.health_check_grace_period = Some(scope.millis(child)?);
        }
        other => {
            // 未知のキーは保持して書き戻す
            app.extra.insert(other.to_string(), node_to_json(child));
        }
    }

    Ok(())
}
