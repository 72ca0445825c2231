use std::path::PathBuf;

use anyhow::Result;
use bookmark_export::orchestrator::{run_import, App};
use bookmark_export::{logger, Config};
use clap::{Parser, Subcommand};

/// 导出书签时间线为 Markdown
#[derive(Parser, Debug)]
#[command(name = "bookmark_export", version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 从书签页导出新书签（默认）
    Export {
        /// 收集完成后不经确认直接保存
        #[arg(short, long)]
        yes: bool,
    },
    /// 从旧的导出文档恢复已导出记录
    Import {
        /// 导出文档路径
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logger::init(cli.verbose || config.verbose_logging);

    match cli.command.unwrap_or(Command::Export { yes: false }) {
        Command::Export { yes } => {
            let auto_confirm = yes || config.auto_confirm;
            App::initialize(config).await?.run_export(auto_confirm).await?;
        }
        Command::Import { file } => run_import(&config, &file).await?,
    }

    Ok(())
}
