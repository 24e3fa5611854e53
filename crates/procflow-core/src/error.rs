use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("JSONパースエラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAMLパースエラー: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("{owner} のフィールド '{field}' が不正です: {message}")]
    InvalidField {
        owner: String,
        field: String,
        message: String,
    },

    #[error("時間の指定が不正です: '{0}'（例: 4000, 500ms, 60s, 1m）")]
    InvalidDuration(String),

    #[error("サイズの指定が不正です: '{0}'（例: 512M, 1G）")]
    InvalidSize(String),

    #[error("未対応のファイル形式です: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("app が見つかりません: {0}")]
    AppNotFound(String),

    #[error("環境が見つかりません: {0}")]
    EnvironmentNotFound(String),

    #[error("deploy '{0}' に host が指定されていません")]
    NoDeployHosts(String),

    #[error("deploy '{env}' に {field} が指定されていません")]
    MissingDeployField { env: String, field: &'static str },
}

pub type Result<T> = std::result::Result<T, FlowError>;
