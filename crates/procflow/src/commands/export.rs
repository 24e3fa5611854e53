use colored::Colorize;
use procflow_core::{Ecosystem, Format};
use std::path::PathBuf;

pub async fn handle(
    ecosystem: &Ecosystem,
    format: Option<Format>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    match output {
        // 形式: --format > 出力先の拡張子
        Some(path) => {
            let format = procflow_core::save_ecosystem(ecosystem, &path, format)?;
            eprintln!(
                "{}",
                format!("✓ {} 形式で書き出しました: {}", format, path.display()).green()
            );
        }
        None => {
            let rendered = procflow_core::to_string(ecosystem, format.unwrap_or(Format::Kdl))?;
            print!("{}", rendered);
        }
    }

    Ok(())
}
