mod commands;
mod utils;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "procflow")]
#[command(about = "プロセスの起動・再起動・デプロイを、ひとつの設定で。", long_about = None)]
struct Cli {
    /// ecosystem ファイル（省略時は自動検出）
    #[arg(
        short = 'f',
        long = "file",
        env = "PROCFLOW_CONFIG_PATH",
        global = true
    )]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 設定を検証
    Validate,
    /// アプリの起動設定を表示
    Inspect {
        /// アプリ名（省略時は全アプリ）
        app: Option<String>,
        /// 環境プロファイル（env_<profile>）
        #[arg(short, long)]
        env: Option<String>,
    },
    /// アプリに渡される環境変数を KEY=VALUE 形式で出力
    Env {
        /// アプリ名
        app: String,
        /// 環境プロファイル（env_<profile>）
        #[arg(short, long)]
        env: Option<String>,
    },
    /// 別の形式で書き出す
    Export {
        /// 出力形式（省略時は -o の拡張子、なければ kdl）
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
        /// 出力先（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// リモートホストへデプロイ
    Deploy {
        /// デプロイ環境名（deploy "<env>"）
        environment: String,
        /// 実行するフェーズ
        #[arg(value_enum, default_value_t = DeployAction::Update)]
        action: DeployAction,
        /// exec で実行するコマンド（-- 以降）
        #[arg(last = true)]
        command: Vec<String>,
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Kdl,
    Json,
    Yaml,
}

impl From<ExportFormat> for procflow_core::Format {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Kdl => Self::Kdl,
            ExportFormat::Json => Self::Json,
            ExportFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeployAction {
    /// 初回セットアップ（clone）
    Setup,
    /// 最新の ref に更新して post-deploy を実行
    Update,
    /// current ディレクトリでコマンドを実行
    Exec,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrに出力（stdoutは export / env の出力に使う）
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("procflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config_path, ecosystem) = utils::load(cli.file)?;

    // コマンドディスパッチ
    match cli.command {
        Commands::Validate => {
            commands::validate::handle(&config_path, &ecosystem).await?;
        }
        Commands::Inspect { app, env } => {
            commands::inspect::handle(&ecosystem, app.as_deref(), env.as_deref()).await?;
        }
        Commands::Env { app, env } => {
            commands::env::handle(&ecosystem, &app, env.as_deref()).await?;
        }
        Commands::Export { format, output } => {
            commands::export::handle(&ecosystem, format.map(Into::into), output).await?;
        }
        Commands::Deploy {
            environment,
            action,
            command,
            yes,
        } => {
            let phase = match action {
                DeployAction::Setup => procflow_core::DeployPhase::Setup,
                DeployAction::Update => procflow_core::DeployPhase::Update,
                DeployAction::Exec => {
                    if command.is_empty() {
                        anyhow::bail!(
                            "実行するコマンドを -- の後に指定してください: procflow deploy {} exec -- <command>",
                            environment
                        );
                    }
                    procflow_core::DeployPhase::Exec(command.join(" "))
                }
            };
            commands::deploy::handle(&ecosystem, &environment, phase, yes).await?;
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
