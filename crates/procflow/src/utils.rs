use colored::Colorize;
use procflow_core::Ecosystem;
use std::path::{Path, PathBuf};

/// 設定ファイルを決定してロードする（共通ロジック）
///
/// 読み込みに失敗した場合はエラー内容を表示して終了する。
pub fn load(file: Option<PathBuf>) -> anyhow::Result<(PathBuf, Ecosystem)> {
    let path = match file {
        Some(path) => path,
        None => match procflow_config::find_ecosystem_file() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("{}", "✗ ecosystem ファイルが見つかりません".red().bold());
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        },
    };

    match procflow_core::load_ecosystem(&path) {
        Ok(ecosystem) => Ok((path, ecosystem)),
        Err(e) => {
            eprintln!("{}", "✗ 設定エラー".red().bold());
            eprintln!("  {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// 読み込んだ設定ファイルを表示
pub fn print_loaded_config_file(path: &Path) {
    println!("📄 読み込んだ設定ファイル: {}", path.display().to_string().cyan());
}

/// 利用可能なCPU数（instances "max" の解決用）
pub fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// ミリ秒を表示用に整形
pub fn format_millis(ms: u128) -> String {
    procflow_core::HumanDuration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX)).to_string()
}

/// バイト数を表示用に整形
pub fn format_bytes(bytes: u64) -> String {
    procflow_core::MemorySize::from_bytes(bytes).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(60_000), "1m");
        assert_eq!(format_millis(4000), "4s");
        assert_eq!(format_millis(1600), "1600ms");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(1 << 30), "1G");
        assert_eq!(format_bytes(512 << 20), "512M");
    }

    #[test]
    fn test_available_cpus_is_positive() {
        assert!(available_cpus() >= 1);
    }
}
