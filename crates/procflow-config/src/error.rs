use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "ecosystem ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: ecosystem.kdl, .ecosystem.kdl, ecosystem.json, ecosystem.yaml, ecosystem.yml\n\
        - ./.procflow/ ディレクトリ\n\
        - ~/.config/procflow/ecosystem.kdl\n\
        または PROCFLOW_CONFIG_PATH 環境変数で直接指定できます"
    )]
    EcosystemFileNotFound,

    #[error("PROCFLOW_CONFIG_PATH で指定されたファイルが存在しません: {0}")]
    ConfigPathNotFound(PathBuf),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
