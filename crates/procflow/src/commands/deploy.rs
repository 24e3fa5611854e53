use colored::Colorize;
use procflow_core::{DeployPhase, DeployPlan, Ecosystem, Severity};
use tokio::process::Command;
use tracing::{debug, info};

pub async fn handle(
    ecosystem: &Ecosystem,
    environment: &str,
    phase: DeployPhase,
    yes: bool,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("デプロイ ({}) を開始します...", phase).blue().bold()
    );
    println!("環境: {}", environment.cyan());

    let target = ecosystem.deploy_target(environment)?;
    let plan = match &phase {
        DeployPhase::Setup => DeployPlan::setup(environment, target)?,
        DeployPhase::Update => DeployPlan::update(environment, target)?,
        DeployPhase::Exec(command) => DeployPlan::exec(environment, target, command)?,
    };

    // この環境に関する検証結果を表示
    let prefix = format!("deploy.{}.", environment);
    let report = procflow_core::validate(ecosystem);
    let issues: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.location.starts_with(&prefix))
        .collect();
    for issue in &issues {
        let label = match issue.severity {
            Severity::Error => "✗".red(),
            Severity::Warning => "⚠".yellow(),
        };
        println!("  {} {}: {}", label, issue.location, issue.message);
    }

    print_plan(&plan);

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!(
            "{}",
            "リモートホストでコマンドを実行します。続行するには --yes を指定してください。"
                .yellow()
        );
        return Ok(());
    }

    if issues.iter().any(|i| i.severity == Severity::Error) {
        anyhow::bail!("deploy '{}' の設定にエラーがあります", environment);
    }

    execute(&plan).await?;

    println!();
    println!(
        "{}",
        format!("✓ デプロイ ({}) が完了しました！", plan.phase)
            .green()
            .bold()
    );
    Ok(())
}

fn print_plan(plan: &DeployPlan) {
    println!();
    println!("{}", "実行計画:".bold());
    if !plan.local_steps.is_empty() {
        println!("  {}", "local".cyan());
        for step in &plan.local_steps {
            println!("    • {}: {}", step.label, step.command.dimmed());
        }
    }
    for host in &plan.hosts {
        println!("  {}", host.destination.cyan());
        for step in &host.steps {
            println!("    • {}: {}", step.label, step.command.dimmed());
        }
    }
}

/// 計画を順番に実行（最初に失敗したステップで中断）
async fn execute(plan: &DeployPlan) -> anyhow::Result<()> {
    let total = plan.step_count();
    let mut current = 0;

    for step in &plan.local_steps {
        current += 1;
        println!();
        println!(
            "{}",
            format!("【Step {}/{}】{} (local)", current, total, step.label).yellow()
        );
        println!("    $ {}", step.command.dimmed());
        debug!(command = %step.command, "Running local step");

        let status = Command::new("sh")
            .arg("-c")
            .arg(&step.command)
            .status()
            .await?;
        if !status.success() {
            anyhow::bail!("{} が失敗しました (local, {})", step.label, status);
        }
    }

    for host in &plan.hosts {
        println!();
        println!(
            "{}",
            format!("SSHで {} に接続中...", host.destination).blue()
        );
        info!(host = %host.host, steps = host.steps.len(), "Deploying to host");

        for step in &host.steps {
            current += 1;
            println!(
                "{}",
                format!("【Step {}/{}】{}", current, total, step.label).yellow()
            );
            println!("    $ {}", step.command.dimmed());

            let args = plan.ssh_args(host, step);
            debug!(?args, "Running ssh");
            let status = Command::new("ssh").args(&args).status().await?;
            if !status.success() {
                anyhow::bail!(
                    "{} が失敗しました ({}, {})",
                    step.label,
                    host.destination,
                    status
                );
            }
            println!("    {}", "✓ 完了".green());
        }
    }

    Ok(())
}
