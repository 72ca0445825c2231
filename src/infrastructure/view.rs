//! 页面视图边界
//!
//! 抽取器只通过这个 trait 读取页面和发出滚动命令，
//! 浏览器实现见 [`PageView`](super::PageView)，测试中可以用脚本化的假视图替代。

use anyhow::Result;
use serde_json::Value as JsonValue;

/// 滚动目标位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPosition {
    Top,
    Bottom,
}

/// 渲染中的时间线视图
///
/// 页面会被外部持续修改（虚拟列表），两次读取之间元素数量不保证稳定。
#[allow(async_fn_in_trait)]
pub trait RenderedView {
    /// 当前页面 URL
    async fn current_url(&self) -> Result<String>;

    /// 当前已渲染的所有推文元素快照（原始 JSON，由解析器逐条解析）
    async fn post_nodes(&self) -> Result<Vec<JsonValue>>;

    /// 滚动到指定位置
    async fn scroll_to(&self, position: ScrollPosition) -> Result<()>;

    /// 当前可滚动高度
    async fn scroll_height(&self) -> Result<u64>;
}
