//! 书签抽取服务 - 业务能力层
//!
//! 负责滚动页面并收集推文，分两个阶段：
//!
//! 1. **预扫描**：滚动到底，统计页面上书签总数，用于进度显示
//! 2. **收集**：回到顶部重新滚动，按本轮已见集合去重，
//!    过滤掉已导出的推文，连续若干轮没有新推文时结束
//!
//! 每次暂停都可以被取消，整个过程受最长运行时间限制。

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ExportError;
use crate::infrastructure::{RenderedView, ScrollPosition};
use crate::models::{Item, SeenSet};
use crate::services::item_parser::ItemParser;
use crate::workflow::EventSink;

/// 抽取参数
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub census_delay: Duration,
    pub harvest_delay: Duration,
    pub settle_delay: Duration,
    pub census_stable_rounds: usize,
    pub stall_retries: usize,
    pub max_duration: Duration,
}

impl From<&Config> for ExtractorSettings {
    fn from(config: &Config) -> Self {
        Self {
            census_delay: config.census_delay(),
            harvest_delay: config.harvest_delay(),
            settle_delay: config.settle_delay(),
            census_stable_rounds: config.census_stable_rounds.max(1),
            stall_retries: config.stall_retries.max(1),
            max_duration: config.max_duration(),
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// 连续无进展计数
///
/// 一轮没有新推文不足以说明已经到底（页面加载是异步的），
/// 连续达到阈值才视为收敛；出现新推文立即清零。
#[derive(Debug, Clone)]
pub struct StallCounter {
    count: usize,
    threshold: usize,
}

impl StallCounter {
    pub fn new(threshold: usize) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    /// 记录一轮的新增数量，返回是否已收敛
    pub fn observe(&mut self, fresh: usize) -> bool {
        if fresh == 0 {
            self.count += 1;
        } else {
            self.count = 0;
        }
        self.is_converged()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_converged(&self) -> bool {
        self.count >= self.threshold
    }
}

/// 书签抽取器
pub struct Extractor {
    parser: ItemParser,
    settings: ExtractorSettings,
}

impl Extractor {
    pub fn new(settings: ExtractorSettings) -> Result<Self> {
        Ok(Self {
            parser: ItemParser::new()?,
            settings,
        })
    }

    /// 执行完整的两阶段抽取
    ///
    /// # 参数
    /// - `view`: 页面视图
    /// - `seen`: 已导出记录（调用方持有的内存副本，抽取期间不再读存储）
    /// - `sink`: 进度消息发送端
    /// - `cancel`: 取消信号
    ///
    /// # 返回
    /// 本次收集到的、不在已导出记录中的推文（按收集顺序）
    pub async fn run<V: RenderedView>(
        &self,
        view: &V,
        seen: &SeenSet,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>> {
        let started = Instant::now();

        let total = self.census(view, sink, cancel, started).await?;
        info!("✓ 预扫描完成，页面上共有 {} 条书签", total);

        let items = self
            .harvest(view, seen, total, sink, cancel, started)
            .await?;
        info!(
            "✓ 收集完成，新书签 {} 条，用时 {:.1?}",
            items.len(),
            started.elapsed()
        );

        Ok(items)
    }

    /// 预扫描：一直滚动到页面高度连续不变，返回出现过的书签总数
    async fn census<V: RenderedView>(
        &self,
        view: &V,
        sink: &EventSink,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<usize> {
        info!("🔍 开始预扫描书签总数...");

        let mut census: HashSet<String> = HashSet::new();
        let mut stable_rounds = 0;
        let mut round = 0;

        loop {
            self.check(cancel, started)?;
            round += 1;

            for item in self.collect(view).await? {
                census.insert(item.id);
            }

            let before = view.scroll_height().await?;
            view.scroll_to(ScrollPosition::Bottom).await?;
            self.pause(self.settings.census_delay, cancel, started).await?;
            let after = view.scroll_height().await?;

            if after == before {
                stable_rounds += 1;
            } else {
                stable_rounds = 0;
            }

            debug!(
                "[预扫描 #{}] 已发现 {} 条, 高度 {} → {}, 连续不变 {}/{}",
                round,
                census.len(),
                before,
                after,
                stable_rounds,
                self.settings.census_stable_rounds
            );
            sink.progress(0, census.len(), format!("正在统计书签... 已发现 {} 条", census.len()));

            if stable_rounds >= self.settings.census_stable_rounds {
                break;
            }
        }

        view.scroll_to(ScrollPosition::Top).await?;
        self.pause(self.settings.settle_delay, cancel, started).await?;

        Ok(census.len())
    }

    /// 收集：按本轮已见集合去重，跳过已导出的推文
    async fn harvest<V: RenderedView>(
        &self,
        view: &V,
        seen: &SeenSet,
        total: usize,
        sink: &EventSink,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<Vec<Item>> {
        info!("📥 开始收集书签 (已导出记录 {} 条)", seen.len());

        // 虚拟列表会反复渲染同一条推文，需要单独的本轮已见集合
        let mut seen_this_pass: HashSet<String> = HashSet::new();
        let mut batch: Vec<Item> = Vec::new();
        let mut stall = StallCounter::new(self.settings.stall_retries);
        let mut round = 0;

        loop {
            self.check(cancel, started)?;
            round += 1;

            let mut fresh = 0;
            for item in self.collect(view).await? {
                if !seen_this_pass.insert(item.id.clone()) {
                    continue;
                }
                fresh += 1;
                if seen.contains(&item.id) {
                    debug!("跳过已导出: {}", item);
                } else {
                    debug!("新书签: {}", item);
                    batch.push(item);
                }
            }

            let processed = seen_this_pass.len();
            sink.progress(
                processed,
                total.max(processed),
                format!("正在收集书签... {} 条新书签", batch.len()),
            );

            let converged = stall.observe(fresh);
            debug!(
                "[收集 #{}] 本轮新增 {}, 累计 {}, 新书签 {}, 无进展 {}/{}",
                round,
                fresh,
                processed,
                batch.len(),
                stall.count(),
                self.settings.stall_retries
            );
            if converged {
                break;
            }

            view.scroll_to(ScrollPosition::Bottom).await?;
            self.pause(self.settings.harvest_delay, cancel, started).await?;
        }

        Ok(batch)
    }

    /// 解析当前渲染的全部推文，单条失败不影响其他
    async fn collect<V: RenderedView>(&self, view: &V) -> Result<Vec<Item>> {
        let nodes = view.post_nodes().await?;
        Ok(nodes.iter().filter_map(|node| self.parser.parse(node)).collect())
    }

    async fn pause(
        &self,
        duration: Duration,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<()> {
        let remaining = self.settings.max_duration.saturating_sub(started.elapsed());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExportError::Cancelled.into()),
            _ = sleep(duration.min(remaining)) => {}
        }
        self.check(cancel, started)
    }

    fn check(&self, cancel: &CancellationToken, started: Instant) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled.into());
        }
        let elapsed = started.elapsed();
        if elapsed >= self.settings.max_duration {
            return Err(ExportError::TimedOut { elapsed }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StallCounter;

    #[test]
    fn five_quiet_rounds_converge() {
        let mut stall = StallCounter::new(5);
        for _ in 0..4 {
            assert!(!stall.observe(0));
        }
        assert!(stall.observe(0));
    }

    #[test]
    fn new_item_resets_counter() {
        let mut stall = StallCounter::new(5);
        for _ in 0..4 {
            stall.observe(0);
        }
        assert_eq!(stall.count(), 4);
        assert!(!stall.observe(1));
        assert_eq!(stall.count(), 0);
        assert!(!stall.observe(0));
    }
}
