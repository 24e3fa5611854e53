use crate::utils;
use colored::Colorize;
use procflow_core::{Ecosystem, Severity};
use std::path::Path;

pub async fn handle(config_path: &Path, ecosystem: &Ecosystem) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());
    utils::print_loaded_config_file(config_path);

    let report = procflow_core::validate(ecosystem);

    if !report.issues.is_empty() {
        println!();
        for issue in &report.issues {
            let label = match issue.severity {
                Severity::Error => "✗ error".red().bold(),
                Severity::Warning => "⚠ warning".yellow().bold(),
            };
            println!("  {} {}: {}", label, issue.location.cyan(), issue.message);
        }
    }

    if report.has_errors() {
        eprintln!();
        eprintln!(
            "{}",
            format!("✗ {}個のエラーがあります", report.errors().count())
                .red()
                .bold()
        );
        std::process::exit(1);
    }

    println!();
    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  アプリ: {}個", ecosystem.apps.len());
    let cpus = utils::available_cpus();
    for app in &ecosystem.apps {
        println!(
            "    - {} ({} x{})",
            app.name.cyan(),
            app.effective_exec_mode(),
            app.instance_count(cpus)
        );
    }
    if !ecosystem.deploy.is_empty() {
        println!("  デプロイ環境: {}個", ecosystem.deploy.len());
        for (name, target) in &ecosystem.deploy {
            println!("    - {} ({}個のホスト)", name.cyan(), target.host.len());
        }
    }
    let warnings = report.warnings().count();
    if warnings > 0 {
        println!("  警告: {}個", warnings.to_string().yellow());
    }

    Ok(())
}
