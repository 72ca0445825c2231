//! 收集结果与已导出记录的二次核对

use std::collections::HashSet;

use crate::models::{Item, SeenSet};

/// 过滤掉已导出的推文以及批次内重复的 ID，保持原顺序
///
/// 抽取器读取已导出记录的时间点可能早于当前内存中的记录，这里再核对一次。
pub fn reconcile(batch: Vec<Item>, seen: &SeenSet) -> Vec<Item> {
    let mut in_batch: HashSet<String> = HashSet::new();
    batch
        .into_iter()
        .filter(|item| !seen.contains(&item.id) && in_batch.insert(item.id.clone()))
        .collect()
}
