//! ログ出力先定義

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

/// ログ出力先
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSinks {
    /// 標準エラー出力のファイル
    pub error_file: Option<PathBuf>,
    /// 標準出力のファイル
    pub out_file: Option<PathBuf>,
    /// stdout/stderr を合わせたファイル
    pub log_file: Option<PathBuf>,
    /// 各行にタイムスタンプを付けるか
    pub time: Option<bool>,
    /// タイムスタンプの書式（`YYYY-MM-DD HH:mm Z` 形式）
    pub log_date_format: Option<String>,
    /// 全インスタンスのログを同じファイルにまとめるか
    pub merge_logs: Option<bool>,
}

impl LogSinks {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 設定されているログファイルを (種別, パス) で列挙
    pub fn paths(&self) -> Vec<(&'static str, &PathBuf)> {
        [
            ("error_file", self.error_file.as_ref()),
            ("out_file", self.out_file.as_ref()),
            ("log_file", self.log_file.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.map(|p| (kind, p)))
        .collect()
    }

    /// インスタンスごとのログファイルパス
    ///
    /// merge_logs が無効な場合、`out.log` は `out-<id>.log` になる。
    pub fn instance_path(&self, path: &std::path::Path, instance: usize) -> PathBuf {
        if self.merge_logs.unwrap_or(false) {
            return path.to_path_buf();
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = match path.extension() {
            Some(ext) => format!("{}-{}.{}", stem, instance, ext.to_string_lossy()),
            None => format!("{}-{}", stem, instance),
        };
        path.with_file_name(file_name)
    }

    /// ログ行に付けるタイムスタンプを生成
    ///
    /// `log_date_format` が無く `time` も無効なら None。
    pub fn format_timestamp<Tz>(&self, at: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match &self.log_date_format {
            Some(format) => Some(at.format(&moment_to_strftime(format)).to_string()),
            None if self.time.unwrap_or(false) => Some(at.to_rfc3339()),
            None => None,
        }
    }
}

/// moment 形式のトークン（長いものから順に照合する）
const MOMENT_TOKENS: [(&str, &str); 16] = [
    ("YYYY", "%Y"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("ZZ", "%z"),
    ("Do", "%e"),
    ("Z", "%:z"),
    ("A", "%p"),
    ("a", "%P"),
    ("X", "%s"),
    ("H", "%-H"),
];

/// moment 形式の日付書式を chrono の strftime 書式に変換
pub fn moment_to_strftime(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while !rest.is_empty() {
        // [...] はリテラル
        if let Some(stripped) = rest.strip_prefix('[')
            && let Some(end) = stripped.find(']')
        {
            out.push_str(&stripped[..end].replace('%', "%%"));
            rest = &stripped[end + 1..];
            continue;
        }
        for (token, strftime) in MOMENT_TOKENS {
            if let Some(stripped) = rest.strip_prefix(token) {
                out.push_str(strftime);
                rest = stripped;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                out.push_str("%%");
            } else {
                out.push(c);
            }
        }
        rest = chars.as_str();
    }

    out
}

/// 書式に日時トークンが含まれているか
pub fn has_moment_token(format: &str) -> bool {
    moment_to_strftime(format).replace("%%", "").contains('%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::path::Path;

    fn sample_time() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-05T14:07:09.123+09:00").unwrap()
    }

    #[test]
    fn test_moment_to_strftime() {
        assert_eq!(moment_to_strftime("YYYY-MM-DD HH:mm Z"), "%Y-%m-%d %H:%M %:z");
        assert_eq!(moment_to_strftime("HH:mm:ss.SSS"), "%H:%M:%S.%3f");
        assert_eq!(moment_to_strftime("[at] HH"), "at %H");
        assert_eq!(moment_to_strftime("100%"), "100%%");
    }

    #[test]
    fn test_format_timestamp_with_format() {
        let logs = LogSinks {
            log_date_format: Some("YYYY-MM-DD HH:mm Z".to_string()),
            ..Default::default()
        };
        assert_eq!(
            logs.format_timestamp(&sample_time()).as_deref(),
            Some("2024-03-05 14:07 +09:00")
        );
    }

    #[test]
    fn test_format_timestamp_time_only() {
        let logs = LogSinks {
            time: Some(true),
            ..Default::default()
        };
        assert_eq!(
            logs.format_timestamp(&sample_time()).as_deref(),
            Some("2024-03-05T14:07:09.123+09:00")
        );

        assert!(LogSinks::default().format_timestamp(&sample_time()).is_none());
    }

    #[test]
    fn test_has_moment_token() {
        assert!(has_moment_token("YYYY-MM-DD"));
        assert!(!has_moment_token("[literal only]"));
        assert!(!has_moment_token("---"));
    }

    #[test]
    fn test_instance_path() {
        let separate = LogSinks::default();
        assert_eq!(
            separate.instance_path(Path::new("./logs/out.log"), 2),
            Path::new("./logs/out-2.log")
        );

        let merged = LogSinks {
            merge_logs: Some(true),
            ..Default::default()
        };
        assert_eq!(
            merged.instance_path(Path::new("./logs/out.log"), 2),
            Path::new("./logs/out.log")
        );
    }
}
