pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};
use tracing::debug;

/// 設定ファイルを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "PROCFLOW_CONFIG_PATH";

/// プロジェクト内で探すファイル名（優先順）
pub const CANDIDATES: [&str; 5] = [
    "ecosystem.kdl",
    ".ecosystem.kdl",
    "ecosystem.json",
    "ecosystem.yaml",
    "ecosystem.yml",
];

/// プロジェクト用の設定ディレクトリ名
pub const PROJECT_DIR: &str = ".procflow";

/// グローバル設定ファイルのパス（~/.config/procflow/ecosystem.kdl）
pub fn global_ecosystem_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("procflow").join("ecosystem.kdl"))
}

/// ecosystem ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 PROCFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: ecosystem.kdl, .ecosystem.kdl, ecosystem.json, ecosystem.yaml, ecosystem.yml
/// 3. ./.procflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/procflow/ecosystem.kdl (グローバル設定)
pub fn find_ecosystem_file() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    find_ecosystem_file_from(&current_dir)
}

/// 指定ディレクトリを起点に ecosystem ファイルを探す
pub fn find_ecosystem_file_from(dir: &Path) -> Result<PathBuf> {
    // 1. 環境変数で直接指定（存在しなければエラー）
    if let Some(config_path) = std::env::var_os(CONFIG_PATH_ENV)
        && !config_path.is_empty()
    {
        let path = PathBuf::from(config_path);
        if path.exists() {
            debug!(path = %path.display(), "Using config from environment");
            return Ok(path);
        }
        return Err(ConfigError::ConfigPathNotFound(path));
    }

    // 2. 指定ディレクトリ、3. ./.procflow/
    let project_dir = dir.join(PROJECT_DIR);
    let search_dirs = [dir.to_path_buf(), project_dir];
    for search_dir in search_dirs.iter().filter(|d| d.is_dir()) {
        if let Some(path) = first_existing(search_dir) {
            debug!(path = %path.display(), "Found ecosystem file");
            return Ok(path);
        }
    }

    // 4. グローバル設定ファイル
    if let Some(global_config) = global_ecosystem_path()
        && global_config.exists()
    {
        debug!(path = %global_config.display(), "Using global ecosystem file");
        return Ok(global_config);
    }

    Err(ConfigError::EcosystemFileNotFound)
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|filename| dir.join(filename))
        .find(|path| path.is_file())
}
