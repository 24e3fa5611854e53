//! 時間・サイズ・インスタンス数などの値型

use crate::error::{FlowError, Result};
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+)\s*(ms|s|m|h|d)?\s*$").unwrap());

static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+)\s*([kmgt])?b?\s*$").unwrap());

/// 大きい単位から順に (ミリ秒, 接尾辞)
const DURATION_UNITS: [(u64, &str); 4] = [
    (86_400_000, "d"),
    (3_600_000, "h"),
    (60_000, "m"),
    (1_000, "s"),
];

/// 大きい単位から順に (バイト, 接尾辞)。1024 基数
const SIZE_UNITS: [(u64, &str); 4] = [
    (1 << 40, "T"),
    (1 << 30, "G"),
    (1 << 20, "M"),
    (1 << 10, "K"),
];

/// 人間向けの時間指定（`60s`, `500ms`, `1m`, 単位なしはミリ秒）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HumanDuration(u64);

impl HumanDuration {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// 文字列からパース
    pub fn parse(s: &str) -> Result<Self> {
        let caps = DURATION_PATTERN
            .captures(s)
            .ok_or_else(|| FlowError::InvalidDuration(s.to_string()))?;
        let value: u64 = caps[1]
            .parse()
            .map_err(|_| FlowError::InvalidDuration(s.to_string()))?;
        let factor = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
            None | Some("ms") => 1,
            Some("s") => 1_000,
            Some("m") => 60_000,
            Some("h") => 3_600_000,
            Some("d") => 86_400_000,
            Some(_) => return Err(FlowError::InvalidDuration(s.to_string())),
        };
        value
            .checked_mul(factor)
            .map(Self)
            .ok_or_else(|| FlowError::InvalidDuration(s.to_string()))
    }
}

impl From<Duration> for HumanDuration {
    fn from(d: Duration) -> Self {
        Self(d.as_millis().min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0");
        }
        for (unit, suffix) in DURATION_UNITS {
            if self.0 % unit == 0 {
                return write!(f, "{}{}", self.0 / unit, suffix);
            }
        }
        write!(f, "{}ms", self.0)
    }
}

impl FromStr for HumanDuration {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("non-negative milliseconds or a duration string like \"60s\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(HumanDuration(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                u64::try_from(v)
                    .map(HumanDuration)
                    .map_err(|_| E::custom(FlowError::InvalidDuration(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                HumanDuration::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// メモリサイズ（`1G`, `512M`, 単位なしはバイト）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemorySize(u64);

impl MemorySize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> u64 {
        self.0
    }

    /// 文字列からパース
    pub fn parse(s: &str) -> Result<Self> {
        let caps = SIZE_PATTERN
            .captures(s)
            .ok_or_else(|| FlowError::InvalidSize(s.to_string()))?;
        let value: u64 = caps[1]
            .parse()
            .map_err(|_| FlowError::InvalidSize(s.to_string()))?;
        let shift = match caps.get(2).map(|m| m.as_str().to_uppercase()).as_deref() {
            None => 0,
            Some("K") => 10,
            Some("M") => 20,
            Some("G") => 30,
            Some("T") => 40,
            Some(_) => return Err(FlowError::InvalidSize(s.to_string())),
        };
        value
            .checked_mul(1u64 << shift)
            .map(Self)
            .ok_or_else(|| FlowError::InvalidSize(s.to_string()))
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0");
        }
        for (unit, suffix) in SIZE_UNITS {
            if self.0 % unit == 0 {
                return write!(f, "{}{}", self.0 / unit, suffix);
            }
        }
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemorySize {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for MemorySize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MemorySize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SizeVisitor;

        impl Visitor<'_> for SizeVisitor {
            type Value = MemorySize;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("byte count or a size string like \"1G\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(MemorySize(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                u64::try_from(v)
                    .map(MemorySize)
                    .map_err(|_| E::custom(FlowError::InvalidSize(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                MemorySize::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

/// インスタンス数
///
/// `max` は利用可能な全CPUを使う。0 以下の数値は `max` から差し引いた数として解決するが、
/// 検証では不正値として扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instances {
    Max,
    Count(i64),
}

impl Default for Instances {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl Instances {
    /// 文字列からパース（`max` または整数）
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("max") {
            Some(Self::Max)
        } else {
            trimmed.parse().ok().map(Self::Count)
        }
    }

    /// 正の整数または `max` か
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Max => true,
            Self::Count(n) => *n > 0,
        }
    }

    /// 実際に起動するプロセス数を解決（最低1）
    pub fn resolve(&self, available: usize) -> usize {
        let available = available.max(1);
        match *self {
            Self::Max | Self::Count(0) => available,
            Self::Count(n) if n > 0 => n as usize,
            Self::Count(n) => available.saturating_sub(n.unsigned_abs() as usize).max(1),
        }
    }
}

impl fmt::Display for Instances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::Count(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for Instances {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Max => serializer.serialize_str("max"),
            Self::Count(n) => serializer.serialize_i64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Instances {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct InstancesVisitor;

        impl Visitor<'_> for InstancesVisitor {
            type Value = Instances;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or \"max\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                i64::try_from(v)
                    .map(Instances::Count)
                    .map_err(|_| E::custom(format!("instances が大きすぎます: {}", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(Instances::Count(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Instances::parse(v)
                    .ok_or_else(|| E::custom(format!("instances の値が不正です: '{}'", v)))
            }
        }

        deserializer.deserialize_any(InstancesVisitor)
    }
}

/// 実行モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// 単一プロセス（デフォルト）
    #[default]
    #[serde(alias = "fork_mode")]
    Fork,
    /// 複数インスタンスでポートを共有
    #[serde(alias = "cluster_mode")]
    Cluster,
}

impl ExecMode {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fork" | "fork_mode" => Some(Self::Fork),
            "cluster" | "cluster_mode" => Some(Self::Cluster),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fork => "fork",
            Self::Cluster => "cluster",
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
