//! 导出编排器 - 编排层
//!
//! ## 职责
//!
//! 在界面消息、抽取器、已导出记录、文档生成和文件输出之间协调：
//!
//! 1. **前置校验**：确认当前页面是书签页
//! 2. **单会话**：同一时间只允许一个导出任务，重复请求直接拒绝
//! 3. **抽取与核对**：运行抽取器，再按内存中的已导出记录核对一次
//! 4. **会话状态**：持有待保存的文档，直到用户确认保存
//! 5. **保存**：文件写出成功后才更新并持久化已导出记录
//! 6. **导入**：从旧的导出文档恢复已导出记录
//!
//! 每个导出或保存操作都以且仅以一条 `Complete` / `Error` 消息结束。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ExportError;
use crate::infrastructure::RenderedView;
use crate::models::SeenSet;
use crate::services::{
    Extractor, FileEmitter, KeyValueStore, MarkdownFormatter, PermalinkScanner, SeenStore,
};
use crate::workflow::{reconcile, EventSink, ExportMessage, ExportSession};

/// 一次导出的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// 没有新书签，不生成文档
    NoNewItems,
    /// 文档已生成，等待保存
    Ready { count: usize, file_name: String },
}

/// 导出编排器
pub struct ExportOrchestrator<S, E> {
    extractor: Extractor,
    formatter: MarkdownFormatter,
    seen_store: SeenStore<S>,
    emitter: E,
    scanner: PermalinkScanner,
    /// 内存中的已导出记录，启动时加载一次
    seen: Mutex<SeenSet>,
    /// 待保存的导出结果
    session: tokio::sync::Mutex<Option<ExportSession>>,
    active: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl<S: KeyValueStore, E: FileEmitter> ExportOrchestrator<S, E> {
    /// 创建编排器并加载已导出记录
    ///
    /// 读取失败时以空记录启动，本进程内以内存记录为准
    pub async fn initialize(
        extractor: Extractor,
        formatter: MarkdownFormatter,
        store: S,
        emitter: E,
    ) -> Result<Self> {
        let seen_store = SeenStore::new(store);
        let seen = match seen_store.load().await {
            Ok(seen) => {
                info!("🗂️ 已加载 {} 条已导出记录", seen.len());
                seen
            }
            Err(e) => {
                warn!("⚠️ 读取已导出记录失败，以空记录启动: {:#}", e);
                SeenSet::new()
            }
        };

        Ok(Self {
            extractor,
            formatter,
            seen_store,
            emitter,
            scanner: PermalinkScanner::new()?,
            seen: Mutex::new(seen),
            session: tokio::sync::Mutex::new(None),
            active: AtomicBool::new(false),
            cancel: Mutex::new(None),
        })
    }

    /// 当前已导出记录的副本
    pub fn seen_snapshot(&self) -> SeenSet {
        self.lock_seen().clone()
    }

    /// 是否有导出任务在进行
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// 待保存的导出结果
    pub async fn pending(&self) -> Option<ExportSession> {
        self.session.lock().await.clone()
    }

    /// 取消正在进行的导出，返回是否有任务被取消
    pub fn cancel(&self) -> bool {
        let cancel = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        match cancel.as_ref() {
            Some(token) => {
                info!("🛑 正在取消导出...");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// 处理界面发来的控制消息
    pub async fn handle<V: RenderedView>(
        &self,
        message: ExportMessage,
        view: &V,
        sink: &EventSink,
    ) -> Result<()> {
        match message {
            ExportMessage::StartExport => self.start_export(view, sink).await.map(|_| ()),
            ExportMessage::StartExportInPage => self.export_in_page(view, sink).await.map(|_| ()),
            ExportMessage::SaveFile => self.save_file(sink).await.map(|_| ()),
            other => {
                debug!("忽略非控制消息: {:?}", other);
                Ok(())
            }
        }
    }

    /// 校验当前页面后开始导出
    pub async fn start_export<V: RenderedView>(
        &self,
        view: &V,
        sink: &EventSink,
    ) -> Result<ExportOutcome> {
        let guard = self.begin()?;

        let url = match view.current_url().await {
            Ok(url) => url,
            Err(e) => {
                sink.error(format!("无法读取当前页面: {:#}", e));
                return Err(e);
            }
        };
        if !is_bookmarks_page(&url) {
            let err = ExportError::WrongPage { url };
            warn!("⚠️ {}", err);
            sink.error(err.to_string());
            return Err(err.into());
        }

        self.run_session(view, sink, &guard.token).await
    }

    /// 已在书签页内，直接开始导出
    pub async fn export_in_page<V: RenderedView>(
        &self,
        view: &V,
        sink: &EventSink,
    ) -> Result<ExportOutcome> {
        let guard = self.begin()?;
        self.run_session(view, sink, &guard.token).await
    }

    async fn run_session<V: RenderedView>(
        &self,
        view: &V,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<ExportOutcome> {
        sink.status("开始导出书签...");

        // 以内存中的已导出记录为准，存储损坏时本进程仍可继续导出
        let seen = self.seen_snapshot();
        let result = self.extractor.run(view, &seen, sink, cancel).await;

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                error!("❌ 导出失败: {:#}", e);
                sink.error(format!("导出失败: {:#}", e));
                return Err(e);
            }
        };

        let collected = batch.len();
        let fresh = {
            let seen = self.lock_seen();
            reconcile(batch, &seen)
        };
        if fresh.len() < collected {
            debug!("二次核对移除了 {} 条已导出推文", collected - fresh.len());
        }

        if fresh.is_empty() {
            info!("没有新的书签需要导出");
            sink.complete("没有新的书签需要导出");
            return Ok(ExportOutcome::NoNewItems);
        }

        let session = ExportSession::new(fresh, &self.formatter, Local::now());
        let count = session.len();
        let outcome = ExportOutcome::Ready {
            count,
            file_name: session.file_name.clone(),
        };
        info!("✓ 文档已生成 {}", session);
        sink.emit(ExportMessage::ExportData(session.items.clone()));

        let mut pending = self.session.lock().await;
        if let Some(old) = pending.replace(session) {
            warn!("⚠️ 未保存的导出结果已被替换: {}", old);
        }
        drop(pending);

        sink.complete(format!("已收集 {} 条新书签，等待保存", count));
        Ok(outcome)
    }

    /// 保存待保存的文档
    ///
    /// 文件写出失败时已导出记录保持不变，导出结果保留以便重试。
    pub async fn save_file(&self, sink: &EventSink) -> Result<PathBuf> {
        let mut pending = self.session.lock().await;
        let Some(session) = pending.take() else {
            let err = ExportError::NoPendingBatch;
            sink.error(err.to_string());
            return Err(err.into());
        };

        let path = match self.emitter.emit(&session.document, &session.file_name).await {
            Ok(path) => path,
            Err(e) => {
                error!("❌ 保存文件失败 {}: {:#}", session, e);
                sink.error(format!("保存文件失败: {:#}", e));
                // 保留导出结果以便重试
                *pending = Some(session);
                return Err(e);
            }
        };
        drop(pending);

        let updated = {
            let mut seen = self.lock_seen();
            let added = seen.extend(session.ids());
            debug!("已导出记录新增 {} 条", added);
            seen.clone()
        };

        if let Err(e) = self.seen_store.save(&updated).await {
            error!("❌ 更新已导出记录失败: {:#}", e);
            sink.error(format!(
                "文件已保存到 {}，但更新已导出记录失败: {:#}",
                path.display(),
                e
            ));
            return Err(e);
        }

        sink.complete(format!("已保存 {} 条书签到 {}", session.len(), path.display()));
        Ok(path)
    }

    /// 从文档内容导入已导出记录，返回新增数量
    pub async fn import_document(&self, document: &str) -> Result<usize> {
        let ids = self.scanner.extract_ids(document);
        info!("🔗 文档中找到 {} 个推文链接", ids.len());

        let (added, updated) = {
            let mut seen = self.lock_seen();
            let added = seen.extend(ids);
            (added, seen.clone())
        };

        if added > 0 {
            self.seen_store.save(&updated).await?;
        }
        info!("✓ 导入完成，新增 {} 条，共 {} 条", added, updated.len());
        Ok(added)
    }

    /// 从文件导入已导出记录
    pub async fn import_file(&self, path: &Path) -> Result<usize> {
        let document = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取导入文件: {}", path.display()))?;
        self.import_document(&document).await
    }

    /// 占用会话并登记取消信号，从页面校验开始即可取消
    fn begin(&self) -> Result<SessionGuard<'_>> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("⚠️ 已有导出任务在进行中，忽略新的请求");
            return Err(ExportError::SessionInProgress.into());
        }

        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(SessionGuard {
            active: &self.active,
            cancel: &self.cancel,
            token,
        })
    }

    fn lock_seen(&self) -> std::sync::MutexGuard<'_, SeenSet> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 会话结束时撤销取消信号并释放占用标记
struct SessionGuard<'a> {
    active: &'a AtomicBool,
    cancel: &'a Mutex<Option<CancellationToken>>,
    token: CancellationToken,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        *self.cancel.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.active.store(false, Ordering::Release);
    }
}

/// 是否为书签页（x.com / twitter.com 的 `/i/bookmarks`）
pub fn is_bookmarks_page(url: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return false;
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = host.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("mobile."))
        .unwrap_or(host.as_str());

    matches!(host, "x.com" | "twitter.com") && path.starts_with("i/bookmarks")
}
