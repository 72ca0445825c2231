//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接或启动浏览器、创建 JsExecutor / PageView
//! 2. **组装编排器**：已导出记录存储、文件输出、抽取参数
//! 3. **界面**：订阅导出消息并输出进度，确认后发送保存请求
//! 4. **取消**：Ctrl-C 取消正在进行的导出
//!
//! 资源所有者：唯一持有 Browser 的模块

use std::path::Path;

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{JsExecutor, PageView};
use crate::services::{
    DirectoryEmitter, Extractor, ExtractorSettings, JsonFileStore, MarkdownFormatter,
};
use crate::utils::logging::{log_export_summary, log_startup};
use crate::workflow::{EventSink, ExportMessage};

use super::export_orchestrator::ExportOrchestrator;

/// 命令行使用的编排器
pub type FileOrchestrator = ExportOrchestrator<JsonFileStore, DirectoryEmitter>;

/// 按配置组装编排器（不涉及浏览器）
pub async fn build_orchestrator(config: &Config) -> Result<FileOrchestrator> {
    let extractor = Extractor::new(ExtractorSettings::from(config))?;
    ExportOrchestrator::initialize(
        extractor,
        MarkdownFormatter::new(config.include_images),
        JsonFileStore::new(&config.store_path),
        DirectoryEmitter::new(&config.output_dir),
    )
    .await
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    view: PageView,
    orchestrator: FileOrchestrator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let (browser, page) = if config.launch_browser {
            browser::launch_browser(&config, &config.bookmarks_url).await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                &config.bookmarks_url,
                Some("/i/bookmarks"),
            )
            .await?
        };

        // JsExecutor 持有 page，PageView 只通过它访问页面
        let view = PageView::new(JsExecutor::new(page));
        let orchestrator = build_orchestrator(&config).await?;

        Ok(Self {
            config,
            _browser: browser,
            view,
            orchestrator,
        })
    }

    /// 运行一次导出：收集 → 确认 → 保存
    pub async fn run_export(&self, auto_confirm: bool) -> Result<()> {
        let (sink, rx) = EventSink::channel();
        let subscriber = spawn_progress_subscriber(rx);

        let exported = self.export_with_cancel(&sink).await;

        if exported {
            let pending = self.orchestrator.pending().await;
            if let Some(pending) = pending.filter(|session| !session.is_empty()) {
                let target = Path::new(&self.config.output_dir).join(&pending.file_name);
                let confirmed = auto_confirm
                    || confirm(&format!(
                        "是否保存 {} 条新书签到 {}? [Y/n] ",
                        pending.len(),
                        target.display()
                    ))
                    .await?;

                if confirmed {
                    if let Err(e) = self
                        .orchestrator
                        .handle(ExportMessage::SaveFile, &self.view, &sink)
                        .await
                    {
                        debug!("保存未完成: {:#}", e);
                    } else {
                        log_export_summary(pending.len(), self.orchestrator.seen_snapshot().len());
                    }
                } else {
                    warn!("⚠️ 已放弃保存，已导出记录未更新");
                }
            }
        }

        drop(sink);
        if let Err(e) = subscriber.await {
            error!("进度输出任务异常结束: {}", e);
        }
        Ok(())
    }

    /// 发送开始导出请求，期间 Ctrl-C 取消导出
    async fn export_with_cancel(&self, sink: &EventSink) -> bool {
        let export = self
            .orchestrator
            .handle(ExportMessage::StartExport, &self.view, sink);
        tokio::pin!(export);

        let result = loop {
            tokio::select! {
                result = &mut export => break result,
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("监听 Ctrl-C 失败: {}", e);
                    }
                    if !self.orchestrator.cancel() {
                        debug!("当前没有可取消的导出");
                    }
                }
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                debug!("导出未完成: {:#}", e);
                false
            }
        }
    }
}

/// 从历史导出文档恢复已导出记录
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let added = orchestrator.import_file(path).await?;
    info!(
        "✅ 已从 {} 导入 {} 条新记录，当前共 {} 条",
        path.display(),
        added,
        orchestrator.seen_snapshot().len()
    );
    Ok(())
}

/// 订阅导出消息并输出到日志
fn spawn_progress_subscriber(mut rx: mpsc::UnboundedReceiver<ExportMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_progress = None;
        while let Some(message) = rx.recv().await {
            match message {
                ExportMessage::Progress {
                    processed,
                    total,
                    status,
                } => {
                    if last_progress != Some((processed, total)) {
                        info!("[进度 {}/{}] {}", processed, total, status);
                        last_progress = Some((processed, total));
                    }
                }
                ExportMessage::Status(text) => info!("{}", text),
                ExportMessage::Complete(text) => info!("✅ {}", text),
                ExportMessage::Error(text) => error!("❌ {}", text),
                ExportMessage::ExportData(items) => {
                    info!("📦 收到 {} 条新书签", items.len());
                    for item in &items {
                        debug!("  {}", item);
                    }
                }
                control => debug!("忽略控制消息: {:?}", control),
            }
        }
    })
}

/// 在终端询问用户，空输入视为同意
async fn confirm(prompt: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await?.unwrap_or_default();
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}
