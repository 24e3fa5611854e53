//! KDL出力
//!
//! Ecosystem をグループ化したKDL形式で書き出す。出力はパーサーでそのまま読み戻せる。

use crate::model::{App, DeployTarget, Ecosystem, EnvMap, Instances, WatchSetting};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::path::Path;

/// 配列であることを示す型注釈
pub(crate) const LIST_TYPE: &str = "list";

/// EcosystemをKDL文字列に変換
pub fn to_kdl_string(ecosystem: &Ecosystem) -> String {
    let mut doc = KdlDocument::new();

    for app in &ecosystem.apps {
        doc.nodes_mut().push(app_node(app));
    }
    for (env_name, target) in &ecosystem.deploy {
        doc.nodes_mut().push(deploy_node(env_name, target));
    }

    doc.autoformat();
    doc.to_string()
}

fn app_node(app: &App) -> KdlNode {
    let mut node = KdlNode::new("app");
    node.push(KdlEntry::new(KdlValue::String(app.name.clone())));

    let mut children = vec![path_node("script", &app.script)];

    if let Some(instances) = app.instances {
        children.push(value_node(
            "instances",
            match instances {
                Instances::Max => KdlValue::String("max".to_string()),
                Instances::Count(n) => KdlValue::Integer(i128::from(n)),
            },
        ));
    }
    if let Some(mode) = app.exec_mode {
        children.push(string_node("exec_mode", mode.as_str()));
    }

    if !app.env.is_empty() {
        children.push(env_node(None, &app.env));
    }
    for (profile, env) in &app.env_profiles {
        children.push(env_node(Some(profile), env));
    }

    let restart = &app.restart;
    if !restart.is_empty() {
        let mut group = Vec::new();
        if let Some(v) = restart.autorestart {
            group.push(bool_node("autorestart", v));
        }
        if let Some(v) = restart.max_restarts {
            group.push(int_node("max_restarts", u64::from(v)));
        }
        if let Some(v) = restart.min_uptime {
            group.push(string_node("min_uptime", &v.to_string()));
        }
        if let Some(v) = restart.restart_delay {
            group.push(int_node("restart_delay", v));
        }
        if let Some(v) = restart.kill_timeout {
            group.push(int_node("kill_timeout", v));
        }
        if let Some(v) = restart.listen_timeout {
            group.push(int_node("listen_timeout", v));
        }
        if let Some(v) = restart.max_memory_restart {
            group.push(string_node("max_memory_restart", &v.to_string()));
        }
        children.push(group_node("restart", group));
    }

    let logs = &app.logs;
    if !logs.is_empty() {
        let mut group = Vec::new();
        for (kind, path) in logs.paths() {
            group.push(path_node(kind, path));
        }
        if let Some(v) = logs.time {
            group.push(bool_node("time", v));
        }
        if let Some(v) = &logs.log_date_format {
            group.push(string_node("log_date_format", v));
        }
        if let Some(v) = logs.merge_logs {
            group.push(bool_node("merge_logs", v));
        }
        children.push(group_node("logs", group));
    }

    if !app.watch.is_empty() {
        let mut watch = KdlNode::new("watch");
        match &app.watch.watch {
            Some(WatchSetting::Enabled(enabled)) => {
                watch.push(KdlEntry::new(KdlValue::Bool(*enabled)));
            }
            Some(WatchSetting::Paths(paths)) => {
                if paths.is_empty() {
                    watch.set_ty(LIST_TYPE);
                }
                for path in paths {
                    watch.push(KdlEntry::new(KdlValue::String(path.clone())));
                }
            }
            None => {}
        }
        if !app.watch.ignore_watch.is_empty() {
            let mut ignore = KdlNode::new("ignore");
            for pattern in &app.watch.ignore_watch {
                ignore.push(KdlEntry::new(KdlValue::String(pattern.clone())));
            }
            let mut doc = KdlDocument::new();
            doc.nodes_mut().push(ignore);
            watch.set_children(doc);
        }
        children.push(watch);
    }

    let monitoring = &app.monitoring;
    if monitoring.pmx.is_some() || monitoring.health_check_grace_period.is_some() {
        let mut group = Vec::new();
        if let Some(v) = monitoring.pmx {
            group.push(bool_node("pmx", v));
        }
        if let Some(v) = monitoring.health_check_grace_period {
            group.push(int_node("health_check_grace_period", v));
        }
        children.push(group_node("monitoring", group));
    }

    for (key, value) in &app.extra {
        children.push(json_node(key, value));
    }

    node.set_children(document(children));
    node
}

fn deploy_node(env_name: &str, target: &DeployTarget) -> KdlNode {
    let mut node = KdlNode::new("deploy");
    node.push(KdlEntry::new(KdlValue::String(env_name.to_string())));

    let mut children = Vec::new();
    if let Some(user) = &target.user {
        children.push(string_node("user", user));
    }
    if !target.host.is_empty() {
        children.push(strings_node("host", &target.host));
    }
    if let Some(git_ref) = &target.git_ref {
        children.push(string_node("ref", git_ref));
    }
    if let Some(repo) = &target.repo {
        children.push(string_node("repo", repo));
    }
    if let Some(path) = &target.path {
        children.push(path_node("path", path));
    }
    let commands = [
        ("pre-setup", &target.pre_setup),
        ("post-setup", &target.post_setup),
        ("pre-deploy-local", &target.pre_deploy_local),
        ("pre-deploy", &target.pre_deploy),
        ("post-deploy", &target.post_deploy),
    ];
    for (name, command) in commands {
        if let Some(command) = command {
            children.push(string_node(name, command));
        }
    }
    if let Some(key) = &target.key {
        children.push(path_node("key", key));
    }
    if let Some(port) = target.port {
        children.push(int_node("port", u64::from(port)));
    }
    if !target.ssh_options.is_empty() {
        children.push(strings_node("ssh_options", &target.ssh_options));
    }
    if !target.env.is_empty() {
        children.push(env_node(None, &target.env));
    }

    node.set_children(document(children));
    node
}

fn env_node(profile: Option<&String>, env: &EnvMap) -> KdlNode {
    let mut node = KdlNode::new("env");
    if let Some(profile) = profile {
        node.push(KdlEntry::new(KdlValue::String(profile.clone())));
    }
    let vars = env
        .iter()
        .map(|(key, value)| value_node(key, value.to_kdl()))
        .collect();
    node.set_children(document(vars));
    node
}

/// 未知のキーをKDLノードに戻す
///
/// 配列は `(list)` 注釈付きで書き、要素数0や1でもスカラーと区別できるようにする。
/// 要素にオブジェクトや配列を含む場合は `-` 子ノードの並びにする。
fn json_node(key: &str, value: &serde_json::Value) -> KdlNode {
    let mut node = KdlNode::new(key);
    match value {
        serde_json::Value::Array(items) => {
            node.set_ty(LIST_TYPE);
            if items.iter().all(is_scalar) {
                for item in items {
                    node.push(KdlEntry::new(json_to_kdl(item)));
                }
            } else {
                let children = items.iter().map(|item| json_node("-", item)).collect();
                node.set_children(document(children));
            }
        }
        serde_json::Value::Object(map) => {
            let children = map.iter().map(|(k, v)| json_node(k, v)).collect();
            node.set_children(document(children));
        }
        scalar => node.push(KdlEntry::new(json_to_kdl(scalar))),
    }
    node
}

fn is_scalar(value: &serde_json::Value) -> bool {
    !matches!(
        value,
        serde_json::Value::Array(_) | serde_json::Value::Object(_)
    )
}

fn json_to_kdl(value: &serde_json::Value) -> KdlValue {
    match value {
        serde_json::Value::Null => KdlValue::Null,
        serde_json::Value::Bool(b) => KdlValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => KdlValue::Integer(i128::from(i)),
            None => n
                .as_u64()
                .map(|u| KdlValue::Integer(i128::from(u)))
                .unwrap_or_else(|| KdlValue::Float(n.as_f64().unwrap_or_default())),
        },
        serde_json::Value::String(s) => KdlValue::String(s.clone()),
        other => KdlValue::String(other.to_string()),
    }
}

fn document(nodes: Vec<KdlNode>) -> KdlDocument {
    let mut doc = KdlDocument::new();
    doc.nodes_mut().extend(nodes);
    doc
}

fn group_node(name: &str, children: Vec<KdlNode>) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.set_children(document(children));
    node
}

fn value_node(name: &str, value: KdlValue) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    node
}

fn string_node(name: &str, value: &str) -> KdlNode {
    value_node(name, KdlValue::String(value.to_string()))
}

fn strings_node(name: &str, values: &[String]) -> KdlNode {
    let mut node = KdlNode::new(name);
    for value in values {
        node.push(KdlEntry::new(KdlValue::String(value.clone())));
    }
    node
}

fn path_node(name: &str, path: &Path) -> KdlNode {
    string_node(name, &path.to_string_lossy())
}

fn bool_node(name: &str, value: bool) -> KdlNode {
    value_node(name, KdlValue::Bool(value))
}

fn int_node(name: &str, value: u64) -> KdlNode {
    value_node(name, KdlValue::Integer(i128::from(value)))
}
