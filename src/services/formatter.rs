//! Markdown 文档生成服务 - 业务能力层
//!
//! 纯函数：相同的推文序列和生成时间得到完全相同的文档。

use std::cmp::Ordering;
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Local, NaiveDate};

use crate::models::Item;

/// 文档标题
const DOCUMENT_TITLE: &str = "Twitter Bookmarks";

/// 导出文件名前缀
pub const FILE_PREFIX: &str = "twitter_bookmarks_";

/// 导出文件扩展名
pub const FILE_EXTENSION: &str = "md";

/// 建议的导出文件名：前缀 + YYYYMMDD + 扩展名
pub fn suggested_file_name(date: NaiveDate) -> String {
    format!("{}{}.{}", FILE_PREFIX, date.format("%Y%m%d"), FILE_EXTENSION)
}

/// Markdown 文档生成器
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    include_images: bool,
}

impl MarkdownFormatter {
    pub fn new(include_images: bool) -> Self {
        Self { include_images }
    }

    /// 生成导出文档
    ///
    /// # 参数
    /// - `items`: 推文列表（任意顺序，内部按时间倒序排列）
    /// - `generated_at`: 生成时间，写入文档头
    pub fn render(&self, items: &[Item], generated_at: DateTime<Local>) -> String {
        let sorted = sort_newest_first(items);
        let mut doc = String::new();

        let _ = writeln!(doc, "# {}\n", DOCUMENT_TITLE);
        let _ = writeln!(
            doc,
            "*Exported on {}*\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(doc, "**Bookmarks in this file:** {}\n", sorted.len());
        let (oldest, newest) = date_range(&sorted);
        let _ = writeln!(doc, "**Date Range:** {} to {}\n", oldest, newest);
        doc.push_str("---\n\n");

        for item in sorted {
            self.write_item(&mut doc, item);
        }

        doc
    }

    fn write_item(&self, doc: &mut String, item: &Item) {
        let _ = writeln!(doc, "## {} ({})\n", item.author_name, item.author_handle);
        let _ = writeln!(doc, "*[{}]({})*\n", display_time(&item.timestamp), item.url);

        if !item.text.is_empty() {
            let _ = writeln!(doc, "{}\n", item.text.replace('\n', "\n\n"));
        }

        if self.include_images && !item.images.is_empty() {
            doc.push_str("**Images:**\n\n");
            for url in &item.images {
                let _ = writeln!(doc, "![Image]({})\n", url);
            }
        }

        if !item.videos.is_empty() {
            doc.push_str("**Videos:**\n\n");
            for url in &item.videos {
                let _ = writeln!(doc, "- [Video Link]({})", url);
            }
            doc.push('\n');
        }

        if let Some(quoted) = &item.quoted_item {
            self.write_quoted(doc, quoted);
        }

        doc.push_str("---\n\n");
    }

    /// 引用推文整体放在引用块中，不再展开它自己的引用
    fn write_quoted(&self, doc: &mut String, quoted: &Item) {
        doc.push_str("> **Quoted Tweet:**\n>\n");
        let _ = writeln!(doc, "> **{} ({})**\n>", quoted.author_name, quoted.author_handle);
        let _ = writeln!(doc, "> *[{}]({})*\n>", display_time(&quoted.timestamp), quoted.url);

        for line in quoted.text.lines() {
            let _ = writeln!(doc, "> {}", line);
        }

        if self.include_images && !quoted.images.is_empty() {
            doc.push_str(">\n> **Images (quoted):**\n>\n");
            for url in &quoted.images {
                let _ = writeln!(doc, "> ![Quoted Image]({})", url);
            }
        }

        if !quoted.videos.is_empty() {
            doc.push_str(">\n> **Videos (quoted):**\n>\n");
            for url in &quoted.videos {
                let _ = writeln!(doc, "> - [Quoted Video Link]({})", url);
            }
        }

        doc.push('\n');
    }
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(timestamp).ok()
}

/// 按时间倒序排列；无法解析的时间视为最早，彼此保持原顺序
fn sort_newest_first(items: &[Item]) -> Vec<&Item> {
    let mut sorted: Vec<(&Item, Option<DateTime<FixedOffset>>)> = items
        .iter()
        .map(|item| (item, parse_timestamp(&item.timestamp)))
        .collect();

    sorted.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    sorted.into_iter().map(|(item, _)| item).collect()
}

fn date_range(sorted: &[&Item]) -> (String, String) {
    let dates: Vec<NaiveDate> = sorted
        .iter()
        .filter_map(|item| parse_timestamp(&item.timestamp))
        .map(|ts| ts.naive_utc().date())
        .collect();

    match (dates.iter().min(), dates.iter().max()) {
        (Some(oldest), Some(newest)) => (oldest.to_string(), newest.to_string()),
        _ => ("unknown".to_string(), "unknown".to_string()),
    }
}

fn display_time(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(ts) => ts.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
        None if timestamp.is_empty() => "Link".to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn item(id: &str, timestamp: &str) -> Item {
        Item {
            id: id.to_string(),
            author_name: format!("Author {}", id),
            author_handle: format!("@author{}", id),
            text: format!("text {}", id),
            timestamp: timestamp.to_string(),
            url: format!("https://x.com/author{}/status/{}", id, id),
            images: Vec::new(),
            videos: Vec::new(),
            quoted_item: None,
        }
    }

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn heading_order(doc: &str) -> Vec<String> {
        doc.lines()
            .filter(|l| l.starts_with("## "))
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn sorts_newest_first_and_unparseable_last() {
        let items = vec![
            item("1", "2024-01-01T00:00:00.000Z"),
            item("2", ""),
            item("3", "2024-03-01T00:00:00.000Z"),
            item("4", "yesterday"),
            item("5", "2024-02-01T00:00:00+08:00"),
        ];

        let doc = MarkdownFormatter::new(true).render(&items, generated_at());
        assert_eq!(
            heading_order(&doc),
            vec![
                "## Author 3 (@author3)",
                "## Author 5 (@author5)",
                "## Author 1 (@author1)",
                "## Author 2 (@author2)",
                "## Author 4 (@author4)",
            ]
        );
    }

    #[test]
    fn header_has_count_and_range() {
        let items = vec![
            item("1", "2024-01-01T00:00:00.000Z"),
            item("2", "2024-03-01T00:00:00.000Z"),
        ];
        let doc = MarkdownFormatter::new(true).render(&items, generated_at());

        assert!(doc.starts_with("# Twitter Bookmarks\n\n*Exported on 2024-05-01 12:00:00*\n\n"));
        assert!(doc.contains("**Bookmarks in this file:** 2\n"));
        assert!(doc.contains("**Date Range:** 2024-01-01 to 2024-03-01\n"));
        assert_eq!(doc.matches("---\n").count(), 3);
    }

    #[test]
    fn date_range_agrees_with_item_times() {
        let items = vec![
            item("1", "2024-02-01T00:00:00+08:00"),
            item("2", "2024-03-01T12:00:00.000Z"),
        ];
        let doc = MarkdownFormatter::new(true).render(&items, generated_at());

        assert!(doc.contains("*[2024-01-31 16:00:00](https://x.com/author1/status/1)*"));
        assert!(doc.contains("**Date Range:** 2024-01-31 to 2024-03-01\n"));
    }

    #[test]
    fn renders_item_body_media_and_quote() {
        let mut quoted = item("9", "");
        quoted.text = "quoted line 1\nquoted line 2".to_string();
        quoted.images = vec!["https://pbs.twimg.com/media/q?name=large".to_string()];
        quoted.quoted_item = Some(Box::new(item("10", "")));

        let mut main = item("1", "2024-01-01T08:30:00.000Z");
        main.text = "first\nsecond".to_string();
        main.images = vec!["https://pbs.twimg.com/media/a?name=large".to_string()];
        main.videos = vec!["https://x.com/author1/status/1".to_string()];
        main.quoted_item = Some(Box::new(quoted));

        let doc = MarkdownFormatter::new(true).render(&[main], generated_at());
        let body = doc.split_once("---\n\n").unwrap().1;

        let expected = "\
## Author 1 (@author1)

*[2024-01-01 08:30:00](https://x.com/author1/status/1)*

first

second

**Images:**

![Image](https://pbs.twimg.com/media/a?name=large)

**Videos:**

- [Video Link](https://x.com/author1/status/1)

> **Quoted Tweet:**
>
> **Author 9 (@author9)**
>
> *[Link](https://x.com/author9/status/9)*
>
> quoted line 1
> quoted line 2
>
> **Images (quoted):**
>
> ![Quoted Image](https://pbs.twimg.com/media/q?name=large)

---

";
        assert_eq!(body, expected);
        assert!(!doc.contains("Author 10"));
    }

    #[test]
    fn images_can_be_left_out() {
        let mut main = item("1", "");
        main.images = vec!["https://pbs.twimg.com/media/a?name=large".to_string()];
        let doc = MarkdownFormatter::new(false).render(&[main], generated_at());
        assert!(!doc.contains("**Images:**"));
    }

    #[test]
    fn output_is_deterministic() {
        let items = vec![item("1", "2024-01-01T00:00:00.000Z"), item("2", "bad")];
        let formatter = MarkdownFormatter::new(true);
        assert_eq!(
            formatter.render(&items, generated_at()),
            formatter.render(&items, generated_at())
        );
    }

    #[test]
    fn file_name_uses_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(suggested_file_name(date), "twitter_bookmarks_20240709.md");
    }
}
