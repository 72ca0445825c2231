#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use bookmark_export::services::seen_store::SEEN_IDS_KEY;
use bookmark_export::services::{
    Extractor, ExtractorSettings, FileEmitter, KeyValueStore, MarkdownFormatter, MemoryStore,
};
use bookmark_export::{ExportMessage, ExportOrchestrator, RenderedView, ScrollPosition};
use serde_json::{json, Value as JsonValue};
use tokio::sync::mpsc::UnboundedReceiver;

pub const BOOKMARKS_URL: &str = "https://x.com/i/bookmarks";

/// 一条正常的推文快照
pub fn post(id: u32) -> JsonValue {
    json!({
        "permalink": format!("/user{}/status/{}", id, id),
        "author_text": format!("User {}\n@user{}", id, id),
        "text": format!("post {}", id),
        "datetime": format!("2024-01-{:02}T00:00:00.000Z", id % 28 + 1),
        "image_srcs": [],
        "has_video": false,
    })
}

pub fn fast_settings() -> ExtractorSettings {
    ExtractorSettings {
        census_delay: Duration::ZERO,
        harvest_delay: Duration::ZERO,
        settle_delay: Duration::ZERO,
        census_stable_rounds: 3,
        stall_retries: 5,
        max_duration: Duration::from_secs(60),
    }
}

/// 虚拟列表：只渲染最后 `window` 条，滚动到底每次多加载 `step` 条
pub struct FakeTimeline {
    url: String,
    nodes: Vec<JsonValue>,
    window: usize,
    step: usize,
    loaded: Mutex<usize>,
    url_delay: Duration,
    pub scrolls: AtomicUsize,
}

impl FakeTimeline {
    pub fn new(nodes: Vec<JsonValue>, window: usize, step: usize) -> Self {
        let loaded = window.min(nodes.len());
        Self {
            url: BOOKMARKS_URL.to_string(),
            nodes,
            window,
            step,
            loaded: Mutex::new(loaded),
            url_delay: Duration::ZERO,
            scrolls: AtomicUsize::new(0),
        }
    }

    pub fn with_posts(count: u32) -> Self {
        Self::new((1..=count).map(post).collect(), 3, 2)
    }

    pub fn at_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// 读取页面地址前等待，模拟页面响应慢
    pub fn with_url_delay(mut self, delay: Duration) -> Self {
        self.url_delay = delay;
        self
    }
}

impl RenderedView for FakeTimeline {
    async fn current_url(&self) -> Result<String> {
        if !self.url_delay.is_zero() {
            tokio::time::sleep(self.url_delay).await;
        }
        Ok(self.url.clone())
    }

    async fn post_nodes(&self) -> Result<Vec<JsonValue>> {
        let loaded = *self.loaded.lock().unwrap();
        let start = loaded.saturating_sub(self.window);
        Ok(self.nodes[start..loaded].to_vec())
    }

    async fn scroll_to(&self, position: ScrollPosition) -> Result<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        let mut loaded = self.loaded.lock().unwrap();
        *loaded = match position {
            ScrollPosition::Top => self.window.min(self.nodes.len()),
            ScrollPosition::Bottom => (*loaded + self.step).min(self.nodes.len()),
        };
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(*self.loaded.lock().unwrap() as u64 * 100)
    }
}

/// 每次读取返回预先编排好的一帧，页面高度不变
pub struct ScriptedView {
    frames: Vec<Vec<JsonValue>>,
    pub calls: AtomicUsize,
}

impl ScriptedView {
    pub fn new(frames: Vec<Vec<JsonValue>>) -> Self {
        Self {
            frames,
            calls: AtomicUsize::new(0),
        }
    }
}

impl RenderedView for ScriptedView {
    async fn current_url(&self) -> Result<String> {
        Ok(BOOKMARKS_URL.to_string())
    }

    async fn post_nodes(&self) -> Result<Vec<JsonValue>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.frames.len() - 1);
        Ok(self.frames[index].clone())
    }

    async fn scroll_to(&self, _position: ScrollPosition) -> Result<()> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(1000)
    }
}

/// 写入总是失败的文件输出
pub struct FailingEmitter;

impl FileEmitter for FailingEmitter {
    async fn emit(&self, _document: &str, file_name: &str) -> Result<PathBuf> {
        Err(anyhow!("磁盘已满: {}", file_name))
    }
}

/// 记录写出内容的文件输出
#[derive(Default)]
pub struct RecordingEmitter {
    pub written: Mutex<Vec<(String, String)>>,
}

impl FileEmitter for RecordingEmitter {
    async fn emit(&self, document: &str, file_name: &str) -> Result<PathBuf> {
        self.written
            .lock()
            .unwrap()
            .push((file_name.to_string(), document.to_string()));
        Ok(PathBuf::from(file_name))
    }
}

/// 可读不可写的存储
#[derive(Default)]
pub struct ReadOnlyStore {
    pub inner: MemoryStore,
}

impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, _value: JsonValue) -> Result<()> {
        Err(anyhow!("存储只读: {}", key))
    }
}

pub async fn memory_store_with(ids: &[&str]) -> MemoryStore {
    let store = MemoryStore::new();
    store.set(SEEN_IDS_KEY, json!(ids)).await.unwrap();
    store
}

pub async fn orchestrator<S, E>(
    store: S,
    emitter: E,
    settings: ExtractorSettings,
) -> ExportOrchestrator<S, E>
where
    S: KeyValueStore,
    E: FileEmitter,
{
    ExportOrchestrator::initialize(
        Extractor::new(settings).unwrap(),
        MarkdownFormatter::new(true),
        store,
        emitter,
    )
    .await
    .unwrap()
}

pub fn drain(rx: &mut UnboundedReceiver<ExportMessage>) -> Vec<ExportMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

pub fn terminal_messages(messages: &[ExportMessage]) -> Vec<&ExportMessage> {
    messages.iter().filter(|m| m.is_terminal()).collect()
}
