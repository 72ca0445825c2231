use serde::{Deserialize, Serialize};

/// 一条书签推文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// 推文 ID（永久链接中 `/status/` 之后的数字）
    pub id: String,
    pub author_name: String,
    pub author_handle: String,
    /// 正文，保留换行
    pub text: String,
    /// ISO-8601 时间，页面上没有时为空
    pub timestamp: String,
    /// 永久链接
    pub url: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_item: Option<Box<Item>>,
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview = crate::utils::truncate_text(&self.text, 60);
        write!(f, "#{} {} ({}): {}", self.id, self.author_name, self.author_handle, preview)
    }
}
