//! 設定ファイル形式（KDL / JSON / YAML）

use crate::emitter::to_kdl_string;
use crate::error::{FlowError, Result};
use crate::model::Ecosystem;
use crate::parser::parse_kdl_string;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 設定ファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Kdl,
    Json,
    Yaml,
}

impl Format {
    /// 拡張子から形式を判定
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| FlowError::UnsupportedFormat(path.to_path_buf()))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "kdl" => Some(Self::Kdl),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kdl => "kdl",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// 文字列をパース
    pub fn parse(&self, content: &str) -> Result<Ecosystem> {
        match self {
            Self::Kdl => parse_kdl_string(content),
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }

    /// 文字列に変換
    pub fn render(&self, ecosystem: &Ecosystem) -> Result<String> {
        match self {
            Self::Kdl => Ok(to_kdl_string(ecosystem)),
            Self::Json => {
                let mut json = serde_json::to_string_pretty(ecosystem)?;
                json.push('\n');
                Ok(json)
            }
            Self::Yaml => Ok(serde_yaml::to_string(ecosystem)?),
        }
    }
}

/// 文字列を指定形式でパース
pub fn parse_str(content: &str, format: Format) -> Result<Ecosystem> {
    format.parse(content)
}

/// 指定形式の文字列に変換
pub fn to_string(ecosystem: &Ecosystem, format: Format) -> Result<String> {
    format.render(ecosystem)
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s).ok_or_else(|| FlowError::UnsupportedFormat(s.into()))
    }
}
