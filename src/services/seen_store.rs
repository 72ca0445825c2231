//! 已导出记录存储 - 业务能力层
//!
//! 键值存储边界 + 已导出 ID 集合的读写。
//! 整个程序唯一的持久化状态就是这一个键下的 ID 列表。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::models::SeenSet;

/// 已导出 ID 列表在存储中的键
pub const SEEN_IDS_KEY: &str = "exported_ids";

/// 键值存储
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>>;
    async fn set(&self, key: &str, value: JsonValue) -> Result<()>;
}

/// 单个 JSON 对象文件的键值存储
///
/// 写入先落到临时文件再重命名，避免写到一半留下损坏的文件。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取文件内容，文件不存在或为空时为 `None`
    async fn read_content(&self) -> Result<Option<String>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("存储文件不存在，视为空: {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("无法读取存储文件: {}", self.path.display()))?;
        Ok(Some(content).filter(|c| !c.trim().is_empty()))
    }

    fn parse(&self, content: &str) -> Result<Map<String, JsonValue>> {
        serde_json::from_str(content)
            .with_context(|| format!("无法解析存储文件: {}", self.path.display()))
    }

    /// 写入前的现有内容
    ///
    /// 文件损坏时改名为 `.corrupt` 备份，从空对象开始，这次写入即修复存储。
    async fn read_for_write(&self) -> Result<Map<String, JsonValue>> {
        let Some(content) = self.read_content().await? else {
            return Ok(Map::new());
        };
        match self.parse(&content) {
            Ok(all) => Ok(all),
            Err(e) => {
                let backup = self.path.with_extension("corrupt");
                warn!("⚠️ {:#}，已备份到 {} 后重写", e, backup.display());
                fs::rename(&self.path, &backup)
                    .await
                    .with_context(|| format!("无法备份损坏的存储文件: {}", backup.display()))?;
                Ok(Map::new())
            }
        }
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        match self.read_content().await? {
            Some(content) => Ok(self.parse(&content)?.remove(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<()> {
        let mut all = self.read_for_write().await?;
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建目录: {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(&JsonValue::Object(all))?;
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("无法写入临时文件: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("无法替换存储文件: {}", self.path.display()))?;
        Ok(())
    }
}

/// 内存键值存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// 已导出 ID 集合的读写
pub struct SeenStore<S> {
    store: S,
}

impl<S: KeyValueStore> SeenStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// 读取已导出 ID，不存在时为空集合
    pub async fn load(&self) -> Result<SeenSet> {
        let value = self
            .store
            .get(SEEN_IDS_KEY)
            .await
            .map_err(|e| ExportError::storage(SEEN_IDS_KEY, e))?;

        let seen = match value {
            Some(value) => serde_json::from_value::<SeenSet>(value)
                .map_err(|e| ExportError::storage(SEEN_IDS_KEY, e))?,
            None => SeenSet::new(),
        };

        debug!("已加载 {} 条已导出记录", seen.len());
        Ok(seen)
    }

    /// 写入完整的已导出 ID 集合
    pub async fn save(&self, seen: &SeenSet) -> Result<()> {
        let value = serde_json::to_value(seen)?;
        self.store
            .set(SEEN_IDS_KEY, value)
            .await
            .map_err(|e| ExportError::storage(SEEN_IDS_KEY, e))?;

        info!("💾 已保存 {} 条已导出记录", seen.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_loads_empty_set() {
        let store = SeenStore::new(MemoryStore::new());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_round_trips_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let file_store = JsonFileStore::new(&path);
        file_store.set("other", serde_json::json!(1)).await.unwrap();

        let store = SeenStore::new(file_store);
        let seen: SeenSet = ["10", "20"].into_iter().collect();
        store.save(&seen).await.unwrap();

        let reopened = SeenStore::new(JsonFileStore::new(&path));
        assert_eq!(reopened.load().await.unwrap(), seen);
        assert_eq!(
            reopened.inner().get("other").await.unwrap(),
            Some(serde_json::json!(1))
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_backed_up_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exported_ids.json");
        std::fs::write(&path, r#"{"exported_ids": ["1", "#).unwrap();

        let store = SeenStore::new(JsonFileStore::new(&path));
        assert!(store.load().await.is_err());

        let seen: SeenSet = ["7"].into_iter().collect();
        store.save(&seen).await.unwrap();

        assert_eq!(store.load().await.unwrap(), seen);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("exported_ids.corrupt")).unwrap(),
            r#"{"exported_ids": ["1", "#
        );
    }

    #[test]
    fn corrupt_value_is_a_storage_error() {
        tokio_test::block_on(async {
            let memory = MemoryStore::new();
            memory
                .set(SEEN_IDS_KEY, serde_json::json!({ "not": "a list" }))
                .await
                .unwrap();

            let err = SeenStore::new(memory).load().await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ExportError>(),
                Some(ExportError::Storage { .. })
            ));
        });
    }
}
