//! 統合ローダー
//!
//! 拡張子から形式を判定してファイルを読み込み、Ecosystem を生成する。

use crate::error::{FlowError, Result};
use crate::format::{Format, parse_str};
use crate::model::Ecosystem;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// 設定ファイルをロード
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_ecosystem(path: &Path) -> Result<Ecosystem> {
    let format = Format::from_path(path)?;
    debug!(%format, "Detected config format");

    let content = fs::read_to_string(path).map_err(|e| FlowError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let ecosystem = parse_str(&content, format)?;
    info!(
        apps = ecosystem.apps.len(),
        deploy_envs = ecosystem.deploy.len(),
        "Ecosystem loaded"
    );
    Ok(ecosystem)
}

/// 設定ファイルに書き出す（形式を省略した場合は拡張子から判定）
#[instrument(skip(ecosystem, path), fields(path = %path.display()))]
pub fn save_ecosystem(
    ecosystem: &Ecosystem,
    path: &Path,
    format: Option<Format>,
) -> Result<Format> {
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };
    let rendered = format.render(ecosystem)?;
    fs::write(path, rendered).map_err(|e| FlowError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(%format, "Ecosystem written");
    Ok(format)
}
