//! 从历史导出文档中恢复已导出 ID
//!
//! 存储丢失但旧的导出文件还在时，扫描文档里所有推文永久链接，
//! 把其中的 ID 合并回已导出集合。

use std::collections::BTreeSet;

use anyhow::Result;
use regex::Regex;

/// 永久链接扫描器
pub struct PermalinkScanner {
    re: Regex,
}

impl PermalinkScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(
                r"https?://(?:www\.|mobile\.)?(?:x|twitter)\.com/[A-Za-z0-9_]+/status/(\d+)",
            )?,
        })
    }

    /// 提取文档中全部推文 ID（已去重）
    pub fn extract_ids(&self, document: &str) -> BTreeSet<String> {
        self.re
            .captures_iter(document)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unique_ids_from_both_domains() {
        let document = "\
## Alice (@alice)
*[2024-01-01 10:00:00](https://x.com/alice/status/111)*
again https://x.com/alice/status/111
> *[Link](https://twitter.com/bob/status/222)*
not a tweet: https://example.com/carol/status/333
";

        let ids = PermalinkScanner::new().unwrap().extract_ids(document);
        let expected: BTreeSet<String> = ["111", "222"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn empty_document_has_no_ids() {
        assert!(PermalinkScanner::new().unwrap().extract_ids("").is_empty());
    }
}
