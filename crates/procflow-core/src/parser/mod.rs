//! KDLパーサー
//!
//! procflow のKDL設定ファイルをパースします。
//! 各ノードタイプのパース処理はモジュールに分離されています。

mod app;
mod deploy;
mod values;

use app::parse_app;
use deploy::parse_deploy;

use crate::error::{FlowError, Result};
use crate::model::Ecosystem;
use kdl::KdlDocument;
use std::fs;
use std::path::Path;

/// KDLファイルをパースしてEcosystemを生成
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<Ecosystem> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_kdl_string(&content)
}

/// KDL文字列をパース
pub fn parse_kdl_string(content: &str) -> Result<Ecosystem> {
    let doc: KdlDocument = content.parse()?;
    let mut ecosystem = Ecosystem::default();

    for node in doc.nodes() {
        match node.name().value() {
            "app" => {
                let app = parse_app(node)?;
                if ecosystem.apps.iter().any(|a| a.name == app.name) {
                    return Err(FlowError::InvalidConfig(format!(
                        "app '{}' が重複して定義されています",
                        app.name
                    )));
                }
                ecosystem.apps.push(app);
            }
            "deploy" => {
                let (env_name, target) = parse_deploy(node)?;
                // 同じ環境が複数回書かれた場合は後勝ち
                ecosystem.deploy.insert(env_name, target);
            }
            _ => {
                // 不明なノードはスキップ（project などの追加ノードも許可）
            }
        }
    }

    Ok(ecosystem)
}

#[cfg(test)]
mod tests;
