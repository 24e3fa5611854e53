//! デプロイレシピ
//!
//! deploy 定義から、ホストごとに実行するコマンド列（SSH経由）を組み立てる。
//! 実行は呼び出し側（CLI）が行う。
//!
//! リモート側のディレクトリ構成:
//! ```text
//! <path>/source   git clone 先
//! <path>/current  source へのシンボリックリンク（post-deploy はここで実行）
//! <path>/shared   logs/ pids/ などリリースをまたいで残すもの
//! ```

use crate::error::{FlowError, Result};
use crate::model::{DeployTarget, is_valid_env_key};
use std::fmt;
use std::path::{Path, PathBuf};

/// 実行するフェーズ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPhase {
    /// 初回セットアップ（clone まで）
    Setup,
    /// 最新の ref に更新して post-deploy を実行
    Update,
    /// current ディレクトリで任意のコマンドを実行
    Exec(String),
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Update => write!(f, "update"),
            Self::Exec(_) => write!(f, "exec"),
        }
    }
}

/// 1ステップ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 表示用の説明
    pub label: String,
    /// シェルコマンド
    pub command: String,
}

impl Step {
    fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
        }
    }
}

/// 1ホスト分の実行計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlan {
    pub host: String,
    /// `user@host`
    pub destination: String,
    pub steps: Vec<Step>,
}

/// デプロイ計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub environment: String,
    pub phase: DeployPhase,
    /// ホストより先にローカルで実行するステップ
    pub local_steps: Vec<Step>,
    /// 宣言順のホスト
    pub hosts: Vec<HostPlan>,
    ssh_prefix: Vec<String>,
}

impl DeployPlan {
    /// 初回セットアップの計画
    pub fn setup(environment: &str, target: &DeployTarget) -> Result<Self> {
        let layout = Layout::new(environment, target)?;
        let repo = require(environment, "repo", target.repo.as_deref())?;

        let mut steps = Vec::new();
        if let Some(pre_setup) = &target.pre_setup {
            steps.push(Step::new("pre-setup", pre_setup.clone()));
        }
        steps.push(Step::new(
            "ディレクトリ作成",
            format!(
                "mkdir -p {} {} {}",
                layout.quoted(&layout.source),
                layout.quoted(&layout.shared.join("logs")),
                layout.quoted(&layout.shared.join("pids")),
            ),
        ));
        steps.push(Step::new(
            "git clone",
            format!(
                "git clone {} {}",
                shell_escape(repo),
                layout.quoted(&layout.source)
            ),
        ));
        if let Some(post_setup) = &target.post_setup {
            steps.push(Step::new(
                "post-setup",
                format!("cd {} && {}", layout.quoted(&layout.source), post_setup),
            ));
        }

        Ok(Self::build(environment, DeployPhase::Setup, target, Vec::new(), steps))
    }

    /// 更新デプロイの計画
    pub fn update(environment: &str, target: &DeployTarget) -> Result<Self> {
        let layout = Layout::new(environment, target)?;
        let git_ref = require(environment, "ref", target.git_ref.as_deref())?;

        let local_steps = target
            .pre_deploy_local
            .iter()
            .map(|command| Step::new("pre-deploy-local", command.clone()))
            .collect();

        let source = layout.quoted(&layout.source);
        let current = layout.quoted(&layout.current);

        let mut steps = Vec::new();
        if let Some(pre_deploy) = &target.pre_deploy {
            steps.push(Step::new(
                "pre-deploy",
                format!("cd {} && {}", source, pre_deploy),
            ));
        }
        steps.push(Step::new(
            "git fetch",
            format!("cd {} && git fetch --all --tags", source),
        ));
        steps.push(Step::new(
            format!("git reset ({})", git_ref),
            format!("cd {} && git reset --hard {}", source, shell_escape(git_ref)),
        ));
        steps.push(Step::new(
            "current を更新",
            format!("ln -sfn {} {}", source, current),
        ));
        if let Some(post_deploy) = &target.post_deploy {
            steps.push(Step::new(
                "post-deploy",
                format!(
                    "{}cd {} && {}",
                    export_prefix(target),
                    current,
                    post_deploy
                ),
            ));
        }

        Ok(Self::build(environment, DeployPhase::Update, target, local_steps, steps))
    }

    /// current ディレクトリで任意のコマンドを実行する計画
    pub fn exec(environment: &str, target: &DeployTarget, command: &str) -> Result<Self> {
        let layout = Layout::new(environment, target)?;
        let steps = vec![Step::new(
            "exec",
            format!(
                "{}cd {} && {}",
                export_prefix(target),
                layout.quoted(&layout.current),
                command
            ),
        )];
        Ok(Self::build(
            environment,
            DeployPhase::Exec(command.to_string()),
            target,
            Vec::new(),
            steps,
        ))
    }

    fn build(
        environment: &str,
        phase: DeployPhase,
        target: &DeployTarget,
        local_steps: Vec<Step>,
        steps: Vec<Step>,
    ) -> Self {
        let hosts = target
            .host
            .iter()
            .map(|host| HostPlan {
                host: host.clone(),
                destination: target.destination(host),
                steps: steps.clone(),
            })
            .collect();

        Self {
            environment: environment.to_string(),
            phase,
            local_steps,
            hosts,
            ssh_prefix: ssh_options(target),
        }
    }

    /// ステップを実行する ssh の引数（プログラム名を除く）
    pub fn ssh_args(&self, host: &HostPlan, step: &Step) -> Vec<String> {
        let mut args = self.ssh_prefix.clone();
        args.push(host.destination.clone());
        args.push(step.command.clone());
        args
    }

    /// 全ステップ数（ローカル含む）
    pub fn step_count(&self) -> usize {
        self.local_steps.len() + self.hosts.iter().map(|h| h.steps.len()).sum::<usize>()
    }
}

/// リモートのディレクトリ構成
struct Layout {
    source: PathBuf,
    current: PathBuf,
    shared: PathBuf,
}

impl Layout {
    fn new(environment: &str, target: &DeployTarget) -> Result<Self> {
        if target.host.is_empty() {
            return Err(FlowError::NoDeployHosts(environment.to_string()));
        }
        // env はリモートで export するので、変数名として使えないキーは拒否
        if let Some(key) = target.env.keys().find(|k| !is_valid_env_key(k)) {
            return Err(FlowError::InvalidField {
                owner: format!("deploy \"{}\"", environment),
                field: "env".to_string(),
                message: format!("'{}' は環境変数名として使えません", key),
            });
        }
        let root = target
            .path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| FlowError::MissingDeployField {
                env: environment.to_string(),
                field: "path",
            })?;
        Ok(Self {
            source: root.join("source"),
            current: root.join("current"),
            shared: root.join("shared"),
        })
    }

    fn quoted(&self, path: &Path) -> String {
        shell_escape(&path.to_string_lossy())
    }
}

fn require<'a>(environment: &str, field: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| FlowError::MissingDeployField {
            env: environment.to_string(),
            field,
        })
}

/// `-p` / `-i` / `-o` を組み立てる
fn ssh_options(target: &DeployTarget) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(port) = target.port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    if let Some(key) = &target.key {
        args.push("-i".to_string());
        args.push(key.to_string_lossy().to_string());
    }
    for option in &target.ssh_options {
        args.push("-o".to_string());
        args.push(option.clone());
    }
    args
}

/// deploy の env を `export K='v' && ` の形にする
fn export_prefix(target: &DeployTarget) -> String {
    if target.env.is_empty() {
        return String::new();
    }
    let assignments: Vec<String> = target
        .env
        .iter()
        .map(|(key, value)| format!("{}={}", key, shell_escape(&value.to_string())))
        .collect();
    format!("export {} && ", assignments.join(" "))
}

/// シェル用にエスケープ
pub fn shell_escape(s: &str) -> String {
    // シングルクォートでラップしてエスケープ
    format!("'{}'", s.replace('\'', "'\\''"))
}
