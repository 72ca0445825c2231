//! 推文解析服务 - 业务能力层
//!
//! 只负责把单个元素快照解析为 [`Item`]，不关心滚动和去重。
//! 任何结构异常都在这里吞掉并记录日志，返回 `None`，不会中断整轮采集。

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::models::{Item, PostNode};

/// 引用推文的最大解析层数（只解析一层引用）
pub const MAX_QUOTE_DEPTH: usize = 1;

/// 永久链接的站点前缀
pub const PERMALINK_BASE: &str = "https://x.com";

/// 媒体图片所在域名
const MEDIA_HOST: &str = "pbs.twimg.com/media";

/// 已知的视频站点域名（匹配域名本身或其子域名）
static VIDEO_DOMAINS: phf::Set<&'static str> = phf::phf_set! {
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
};

/// 推文解析器
pub struct ItemParser {
    permalink_re: Regex,
    image_size_re: Regex,
}

impl ItemParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            permalink_re: Regex::new(r"(/[^/?#\s]+/status/(\d+))")?,
            image_size_re: Regex::new(r"([?&])name=\w+")?,
        })
    }

    /// 解析单个元素快照
    ///
    /// 没有永久链接或结构异常时返回 `None`
    pub fn parse(&self, raw: &JsonValue) -> Option<Item> {
        self.parse_at_depth(raw, 0)
    }

    fn parse_at_depth(&self, raw: &JsonValue, depth: usize) -> Option<Item> {
        let node = match PostNode::deserialize(raw) {
            Ok(node) => node,
            Err(e) => {
                warn!("⚠️ 推文元素结构异常，已跳过: {}", e);
                return None;
            }
        };

        if let Some(err) = &node.error {
            warn!("⚠️ 页面脚本采集推文失败，已跳过: {}", err);
            return None;
        }

        self.parse_node(&node, depth)
    }

    fn parse_node(&self, node: &PostNode, depth: usize) -> Option<Item> {
        let Some((path, id)) = node.permalink.as_deref().and_then(|href| self.permalink(href))
        else {
            debug!("元素中没有永久链接，跳过");
            return None;
        };
        let url = format!("{}{}", PERMALINK_BASE, path);

        let (author_name, author_handle) = split_author(node.author_text.as_deref());

        let images = node
            .image_srcs
            .iter()
            .filter(|src| src.contains(MEDIA_HOST))
            .map(|src| self.largest_image(src))
            .collect();

        let videos = collect_videos(node, &url);

        let quoted_item = if depth < MAX_QUOTE_DEPTH {
            node.quoted
                .as_ref()
                .and_then(|raw| self.parse_at_depth(raw, depth + 1))
                .filter(|quoted| quoted.id != id)
                .map(Box::new)
        } else {
            None
        };

        Some(Item {
            id,
            author_name,
            author_handle,
            text: node.text.clone().unwrap_or_default(),
            timestamp: node.datetime.clone().unwrap_or_default(),
            url,
            images,
            videos,
            quoted_item,
        })
    }

    /// 从链接中取出 `/账号/status/ID` 路径和 ID
    fn permalink(&self, href: &str) -> Option<(String, String)> {
        let caps = self.permalink_re.captures(href)?;
        Some((caps[1].to_string(), caps[2].to_string()))
    }

    /// 把图片尺寸参数改为最大尺寸
    fn largest_image(&self, src: &str) -> String {
        self.image_size_re
            .replace_all(src, "${1}name=large")
            .into_owned()
    }
}

/// 作者区块按行拆分：第一行名称，第二行 @账号
fn split_author(author_text: Option<&str>) -> (String, String) {
    let mut lines = author_text
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let name = lines.next().unwrap_or("Unknown").to_string();
    let handle = lines.next().unwrap_or("@unknown").to_string();
    (name, handle)
}

/// 收集视频链接，按出现顺序去重
fn collect_videos(node: &PostNode, permalink: &str) -> Vec<String> {
    let mut videos: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        if !videos.iter().any(|v| v == url) {
            videos.push(url.to_string());
        }
    };

    // 原生视频没有独立地址，用推文本身的链接
    if node.has_video {
        push(permalink);
    }

    node.embed_srcs
        .iter()
        .chain(node.card_links.iter())
        .filter(|link| is_video_link(link))
        .for_each(|link| push(link));

    videos
}

fn is_video_link(url: &str) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };

    let mut candidate = host.as_str();
    loop {
        if VIDEO_DOMAINS.contains(candidate) {
            return true;
        }
        match candidate.split_once('.') {
            Some((_, parent)) => candidate = parent,
            None => return false,
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    let rest = url.split_once("//").map(|(_, rest)| rest)?;
    let host = rest
        .split(|c| matches!(c, '/' | '?' | '#' | ':'))
        .next()
        .filter(|host| !host.is_empty())?;
    Some(host.to_ascii_lowercase())
}
