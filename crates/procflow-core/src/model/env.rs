//! 環境変数定義

use kdl::KdlValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 環境変数のマップ（キー順で安定した出力になる）
pub type EnvMap = BTreeMap<String, EnvValue>;

/// シェルで `export` できる変数名か（`[A-Za-z_][A-Za-z0-9_]*`）
pub fn is_valid_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 環境変数の値
///
/// 設定ファイル上の型（`PORT 5000` なら整数）を保持し、プロセスへ渡す時に文字列化する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl EnvValue {
    /// KDLの値から変換（null は表現できないので None）
    pub fn from_kdl(value: &KdlValue) -> Option<Self> {
        match value {
            KdlValue::String(s) => Some(Self::String(s.clone())),
            KdlValue::Integer(i) => i64::try_from(*i).ok().map(Self::Integer),
            KdlValue::Float(f) => Some(Self::Float(*f)),
            KdlValue::Bool(b) => Some(Self::Bool(*b)),
            KdlValue::Null => None,
        }
    }

    pub fn to_kdl(&self) -> KdlValue {
        match self {
            Self::String(s) => KdlValue::String(s.clone()),
            Self::Integer(i) => KdlValue::Integer(i128::from(*i)),
            Self::Float(f) => KdlValue::Float(*f),
            Self::Bool(b) => KdlValue::Bool(*b),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for EnvValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for EnvValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// 環境変数マップを serde_json の Object に変換
pub fn env_map_to_json(map: &EnvMap) -> serde_json::Value {
    serde_json::Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_keeps_json_types() {
        let map: EnvMap =
            serde_json::from_str(r#"{"NODE_ENV": "production", "PORT": 5000, "DEBUG": false}"#)
                .unwrap();
        assert_eq!(map["NODE_ENV"], EnvValue::from("production"));
        assert_eq!(map["PORT"], EnvValue::Integer(5000));
        assert_eq!(map["DEBUG"], EnvValue::Bool(false));
    }

    #[test]
    fn test_env_value_display() {
        assert_eq!(EnvValue::Integer(5000).to_string(), "5000");
        assert_eq!(EnvValue::Bool(true).to_string(), "true");
        assert_eq!(EnvValue::from("x").to_string(), "x");
    }

    #[test]
    fn test_env_value_kdl_conversion() {
        let value = EnvValue::from_kdl(&KdlValue::Integer(8080)).unwrap();
        assert_eq!(value, EnvValue::Integer(8080));
        assert_eq!(value.to_kdl(), KdlValue::Integer(8080));
        assert!(EnvValue::from_kdl(&KdlValue::Null).is_none());
    }

    #[test]
    fn test_valid_env_key() {
        for key in ["NODE_ENV", "_PRIVATE", "port2"] {
            assert!(is_valid_env_key(key), "{}", key);
        }
        for key in ["", "2FA", "A;rm -rf x", "NODE-ENV", "A B", "A=B"] {
            assert!(!is_valid_env_key(key), "{}", key);
        }
    }
}
