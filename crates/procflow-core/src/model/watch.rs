//! ファイル監視設定

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// watch の指定（有効/無効、または監視対象パスのリスト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchSetting {
    Enabled(bool),
    Paths(Vec<String>),
}

/// ファイル監視による再起動の設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchPolicy {
    pub watch: Option<WatchSetting>,
    /// 監視から除外するglobパターン
    #[serde(default)]
    pub ignore_watch: Vec<String>,
}

impl WatchPolicy {
    pub fn is_empty(&self) -> bool {
        self.watch.is_none() && self.ignore_watch.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        match &self.watch {
            Some(WatchSetting::Enabled(enabled)) => *enabled,
            Some(WatchSetting::Paths(paths)) => !paths.is_empty(),
            None => false,
        }
    }

    /// 監視対象のパス（`watch #true` の場合はアプリのカレントディレクトリ全体）
    pub fn watched_paths(&self) -> Vec<String> {
        match &self.watch {
            Some(WatchSetting::Paths(paths)) => paths.clone(),
            Some(WatchSetting::Enabled(true)) => vec![".".to_string()],
            _ => Vec::new(),
        }
    }

    /// 変更されたパスが除外パターンに該当するか
    ///
    /// パターンはパス全体、またはいずれかのパス要素に一致すれば除外とみなす
    /// （`node_modules` は `a/node_modules/b.js` も除外する）。
    /// 不正なパターンは無視する（検証で報告される）。
    pub fn is_ignored(&self, path: &Path) -> bool {
        let normalized = path.strip_prefix("./").unwrap_or(path);
        self.ignore_watch
            .iter()
            .filter_map(|p| Pattern::new(p.trim_start_matches("./")).ok())
            .any(|pattern| {
                pattern.matches_path(normalized)
                    || normalized
                        .components()
                        .any(|c| pattern.matches(&c.as_os_str().to_string_lossy()))
            })
    }

    /// 不正なglobパターンを (パターン, 理由) で返す
    pub fn invalid_patterns(&self) -> Vec<(String, String)> {
        self.ignore_watch
            .iter()
            .filter_map(|p| Pattern::new(p).err().map(|e| (p.clone(), e.msg.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(ignores: &[&str]) -> WatchPolicy {
        WatchPolicy {
            watch: Some(WatchSetting::Enabled(true)),
            ignore_watch: ignores.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_is_ignored_matches_components() {
        let policy = policy(&["node_modules", "logs", ".git"]);
        assert!(policy.is_ignored(Path::new("node_modules/express/index.js")));
        assert!(policy.is_ignored(Path::new("./logs/out.log")));
        assert!(policy.is_ignored(Path::new("packages/a/node_modules/x.js")));
        assert!(policy.is_ignored(Path::new(".git/HEAD")));
        assert!(!policy.is_ignored(Path::new("src/index.ts")));
    }

    #[test]
    fn test_is_ignored_glob() {
        let policy = policy(&["*.log", "dist/**"]);
        assert!(policy.is_ignored(Path::new("error.log")));
        assert!(policy.is_ignored(Path::new("dist/index.js")));
        assert!(!policy.is_ignored(Path::new("src/logger.ts")));
    }

    #[test]
    fn test_is_enabled() {
        assert!(!WatchPolicy::default().is_enabled());
        assert!(policy(&[]).is_enabled());
        let paths = WatchPolicy {
            watch: Some(WatchSetting::Paths(vec!["src".to_string()])),
            ignore_watch: vec![],
        };
        assert!(paths.is_enabled());
        assert_eq!(paths.watched_paths(), vec!["src".to_string()]);
    }

    #[test]
    fn test_invalid_patterns() {
        let policy = policy(&["logs", "[unclosed"]);
        let invalid = policy.invalid_patterns();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].0, "[unclosed");
    }

    #[test]
    fn test_watch_setting_serde() {
        let s: WatchSetting = serde_json::from_str("false").unwrap();
        assert_eq!(s, WatchSetting::Enabled(false));
        let s: WatchSetting = serde_json::from_str(r#"["src", "lib"]"#).unwrap();
        assert_eq!(
            s,
            WatchSetting::Paths(vec!["src".to_string(), "lib".to_string()])
        );
    }
}
