use serde::Deserialize;
use serde_json::Value as JsonValue;

/// 页面上一条推文元素的快照
///
/// 由页面脚本采集后序列化传回，字段均可能缺失。
/// `quoted` 保留原始 JSON，解析时再按深度限制递归。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostNode {
    /// 第一个指向 `/status/` 的链接 href
    pub permalink: Option<String>,
    /// 作者区块的 innerText（名称、@账号 分行）
    pub author_text: Option<String>,
    /// 正文 innerText
    pub text: Option<String>,
    /// `<time>` 的 datetime 属性
    pub datetime: Option<String>,
    /// 图片 src 列表
    pub image_srcs: Vec<String>,
    /// 是否包含 `<video>` 元素
    pub has_video: bool,
    /// 嵌入播放器 iframe 的 src
    pub embed_srcs: Vec<String>,
    /// 卡片中的外链
    pub card_links: Vec<String>,
    /// 引用推文的原始快照
    pub quoted: Option<JsonValue>,
    /// 页面脚本采集该元素时抛出的异常
    pub error: Option<String>,
}
