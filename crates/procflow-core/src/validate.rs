//! 設定の検証
//!
//! パース時に型で保証できない性質（インスタンス数、パス、ホスト一覧など）を検査する。

use crate::model::{App, DeployTarget, Ecosystem, has_moment_token, is_valid_env_key};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// 未設定テンプレートに残りがちなプレースホルダー
const PLACEHOLDER_MARKERS: [&str; 5] = [
    "your-server-ip",
    "yourusername",
    "your-repo",
    "example.com",
    "changeme",
];

/// 問題の重大度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// 検出された問題
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    /// `apps.api.instances` のような位置
    pub location: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", label, self.location, self.message)
    }
}

/// 検証結果
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Error,
            location: location.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Warning,
            location: location.into(),
            message: message.into(),
        });
    }
}

/// Ecosystem全体を検証
pub fn validate(ecosystem: &Ecosystem) -> ValidationReport {
    let mut report = ValidationReport::default();

    if ecosystem.apps.is_empty() {
        report.error("apps", "app が1つも定義されていません");
    }

    let mut seen = HashSet::new();
    for app in &ecosystem.apps {
        if !app.name.is_empty() && !seen.insert(app.name.as_str()) {
            report.error(
                format!("apps.{}", app.name),
                "app 名が重複しています",
            );
        }
        validate_app(app, &mut report);
    }

    for (env_name, target) in &ecosystem.deploy {
        validate_deploy(env_name, target, &mut report);
    }

    debug!(
        issues = report.issues.len(),
        errors = report.errors().count(),
        "Validation complete"
    );
    report
}

fn validate_app(app: &App, report: &mut ValidationReport) {
    let loc = format!("apps.{}", app.name);

    if app.name.trim().is_empty() {
        report.error("apps", "app 名が空です");
    }

    check_path(report, &format!("{}.script", loc), &app.script);

    if let Some(instances) = app.instances
        && !instances.is_valid()
    {
        report.error(
            format!("{}.instances", loc),
            format!(
                "instances は正の整数または \"max\" を指定してください（現在: {}）",
                instances
            ),
        );
    }

    for (kind, path) in app.logs.paths() {
        check_path(report, &format!("{}.{}", loc, kind), path);
    }

    if let Some(format) = &app.logs.log_date_format
        && !has_moment_token(format)
    {
        report.warning(
            format!("{}.log_date_format", loc),
            format!("'{}' に日時のトークンが含まれていません", format),
        );
    }

    for (pattern, reason) in app.watch.invalid_patterns() {
        report.error(
            format!("{}.ignore_watch", loc),
            format!("'{}' は不正なglobパターンです: {}", pattern, reason),
        );
    }

    if app.restart.max_restarts == Some(0) && app.restart.autorestart != Some(false) {
        report.warning(
            format!("{}.max_restarts", loc),
            "max_restarts が 0 のため、最初のクラッシュで再起動を諦めます",
        );
    }

    for key in app.extra.keys() {
        report.warning(format!("{}.{}", loc, key), "不明なキーです（そのまま保持します）");
    }
}

fn validate_deploy(env_name: &str, target: &DeployTarget, report: &mut ValidationReport) {
    let loc = format!("deploy.{}", env_name);

    if target.host.is_empty() {
        report.error(format!("{}.host", loc), "host が1つも指定されていません");
    }
    for host in &target.host {
        if host.trim().is_empty() || host.contains(char::is_whitespace) {
            report.error(format!("{}.host", loc), format!("'{}' は不正なホストです", host));
        }
    }

    match &target.path {
        Some(path) => check_path(report, &format!("{}.path", loc), path),
        None => report.error(format!("{}.path", loc), "path が指定されていません"),
    }
    if target.repo.is_none() {
        report.warning(format!("{}.repo", loc), "repo が指定されていません（setup できません）");
    }
    if target.git_ref.is_none() {
        report.warning(format!("{}.ref", loc), "ref が指定されていません（update できません）");
    }
    if let Some(key) = &target.key {
        check_path(report, &format!("{}.key", loc), key);
    }
    for key in target.env.keys().filter(|k| !is_valid_env_key(k)) {
        report.error(
            format!("{}.env.{}", loc, key),
            "環境変数名は英字または _ で始まり、英数字と _ のみ使えます",
        );
    }

    let placeholder_fields = [
        ("user", target.user.as_deref()),
        ("repo", target.repo.as_deref()),
    ]
    .into_iter()
    .chain(target.host.iter().map(|h| ("host", Some(h.as_str()))));
    for (field, value) in placeholder_fields {
        if let Some(value) = value
            && let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| value.contains(*m))
        {
            report.warning(
                format!("{}.{}", loc, field),
                format!("プレースホルダー '{}' が残っています", marker),
            );
        }
    }
}

/// 構文的に有効なパスか（空でない、NULを含まない）
fn check_path(report: &mut ValidationReport, location: &str, path: &Path) {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        report.error(location, "パスが空です");
    } else if raw.contains('\0') {
        report.error(location, "パスにNUL文字が含まれています");
    }
}
