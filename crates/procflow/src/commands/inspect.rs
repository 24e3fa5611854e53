use crate::utils;
use colored::Colorize;
use procflow_core::{App, Ecosystem};

pub async fn handle(
    ecosystem: &Ecosystem,
    app_name: Option<&str>,
    profile: Option<&str>,
) -> anyhow::Result<()> {
    let apps: Vec<&App> = match app_name {
        Some(name) => vec![ecosystem.app(name)?],
        None => ecosystem.apps.iter().collect(),
    };

    let cpus = utils::available_cpus();
    for app in apps {
        print_app(app, profile, cpus)?;
        println!();
    }

    if app_name.is_none() && !ecosystem.deploy.is_empty() {
        println!("{}", "デプロイ環境:".bold());
        for (name, target) in &ecosystem.deploy {
            let hosts: Vec<String> = target.host.iter().map(|h| target.destination(h)).collect();
            println!("  {} → {}", name.cyan(), hosts.join(", "));
            if let Some(path) = &target.path {
                println!("    path: {}", path.display());
            }
            if let Some(git_ref) = &target.git_ref {
                println!("    ref:  {}", git_ref);
            }
        }
    }

    Ok(())
}

fn print_app(app: &App, profile: Option<&str>, cpus: usize) -> anyhow::Result<()> {
    println!("{}", format!("▶ {}", app.name).green().bold());

    let script_state = if app.script.exists() {
        "✓".green()
    } else {
        "✗ 未ビルド".red()
    };
    println!("  script:    {} {}", app.script.display(), script_state);
    println!(
        "  mode:      {} (instances: {} → {})",
        app.effective_exec_mode(),
        app.instances.unwrap_or_default(),
        app.instance_count(cpus)
    );

    // 再起動ポリシー
    let policy = app.restart.resolved();
    println!("  {}", "restart:".bold());
    println!("    autorestart:    {}", policy.autorestart);
    println!(
        "    max_restarts:   {} (min_uptime: {})",
        policy.max_restarts,
        utils::format_millis(policy.min_uptime.as_millis())
    );
    println!(
        "    restart_delay:  {}",
        utils::format_millis(policy.restart_delay.as_millis())
    );
    println!(
        "    kill_timeout:   {}",
        utils::format_millis(policy.kill_timeout.as_millis())
    );
    println!(
        "    listen_timeout: {}",
        utils::format_millis(policy.listen_timeout.as_millis())
    );
    if let Some(limit) = policy.max_memory_bytes {
        println!("    max_memory:     {}", utils::format_bytes(limit));
    }

    // ログ
    if !app.logs.is_empty() {
        println!("  {}", "logs:".bold());
        for (kind, path) in app.logs.paths() {
            println!(
                "    {:<10} {}",
                kind,
                app.logs.instance_path(path, 0).display()
            );
        }
        if let Some(sample) = app.logs.format_timestamp(&chrono::Local::now()) {
            println!("    timestamp: {}", sample.dimmed());
        }
    }

    // 監視
    if app.watch.is_enabled() {
        println!(
            "  watch:     {} (ignore: {})",
            app.watch.watched_paths().join(", "),
            app.watch.ignore_watch.join(", ")
        );
    }
    println!(
        "  pmx:       {}{}",
        app.monitoring_enabled(),
        app.monitoring
            .health_check_grace_period
            .map(|ms| format!(" (grace: {})", utils::format_millis(u128::from(ms))))
            .unwrap_or_default()
    );

    // 環境変数
    let env = app.resolve_env(profile)?;
    if !env.is_empty() {
        match profile {
            Some(profile) => println!("  {}", format!("env ({}):", profile).bold()),
            None => println!("  {}", "env:".bold()),
        }
        for (key, value) in &env {
            println!("    {}={}", key.cyan(), value);
        }
    }
    if profile.is_none() && !app.env_profiles.is_empty() {
        let profiles: Vec<&str> = app.env_profiles.keys().map(|k| k.as_str()).collect();
        println!("  profiles:  {}", profiles.join(", ").dimmed());
    }

    if !app.extra.is_empty() {
        let keys: Vec<&str> = app.extra.keys().map(|k| k.as_str()).collect();
        println!("  その他:    {}", keys.join(", ").dimmed());
    }

    Ok(())
}
