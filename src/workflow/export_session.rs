//! 导出会话状态
//!
//! 从"收集完成"到"文件保存"之间持有的临时数据，保存成功后即丢弃。

use std::fmt::Display;

use chrono::{DateTime, Local};

use crate::models::Item;
use crate::services::formatter::{suggested_file_name, MarkdownFormatter};

/// 一次导出的待保存结果
#[derive(Debug, Clone)]
pub struct ExportSession {
    /// 本次新收集的推文（收集顺序）
    pub items: Vec<Item>,
    /// 生成的 Markdown 文档
    pub document: String,
    /// 文档生成时间
    pub generated_at: DateTime<Local>,
    /// 建议的文件名
    pub file_name: String,
}

impl ExportSession {
    /// 用新推文生成文档，构建会话
    pub fn new(items: Vec<Item>, formatter: &MarkdownFormatter, generated_at: DateTime<Local>) -> Self {
        let document = formatter.render(&items, generated_at);
        Self {
            items,
            document,
            file_name: suggested_file_name(generated_at.date_naive()),
            generated_at,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Display for ExportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[导出 {} | {} 条 | {}]",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.items.len(),
            self.file_name
        )
    }
}
