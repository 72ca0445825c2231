//! 基于浏览器页面的视图实现

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::infrastructure::view::{RenderedView, ScrollPosition};
use crate::infrastructure::JsExecutor;
use crate::services::item_parser::MAX_QUOTE_DEPTH;

/// 采集页面上所有推文元素的快照
///
/// `__DEPTH__` 为引用推文的最大采集层数，与解析器的深度限制一致。
const SNAPSHOT_SCRIPT: &str = r#"
(() => {
    const snapshot = (el, depth) => {
        const link = el.querySelector('a[href*="/status/"]');
        const author = el.querySelector('[data-testid="User-Name"]');
        const text = el.querySelector('[data-testid="tweetText"]');
        const time = el.querySelector('time');
        const attrs = (selector, name) => Array.from(el.querySelectorAll(selector))
            .map(node => node.getAttribute(name))
            .filter(Boolean);

        let quoted = null;
        if (depth > 0) {
            const container = el.querySelector("div[role='link'][tabindex='0']");
            const inner = container ? container.querySelector("article[data-testid='tweet']") : null;
            if (inner) {
                quoted = snapshot(inner, depth - 1);
            }
        }

        return {
            permalink: link ? link.getAttribute('href') : null,
            author_text: author ? author.innerText : null,
            text: text ? text.innerText : null,
            datetime: time ? time.getAttribute('datetime') : null,
            image_srcs: attrs('img[src*="pbs.twimg.com/media"]', 'src'),
            has_video: el.querySelector('video') !== null,
            embed_srcs: attrs('iframe[src*="youtube.com/embed/"], iframe[src*="player.vimeo.com/video/"]', 'src'),
            card_links: attrs('[data-testid="card.wrapper"] a[href]', 'href'),
            quoted,
        };
    };

    return Array.from(document.querySelectorAll('article[data-testid="tweet"]'))
        .map(el => {
            try {
                return snapshot(el, __DEPTH__);
            } catch (e) {
                return { error: String(e) };
            }
        });
})()
"#;

/// 浏览器页面视图
pub struct PageView {
    executor: JsExecutor,
    snapshot_script: String,
}

impl PageView {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            snapshot_script: SNAPSHOT_SCRIPT.replace("__DEPTH__", &MAX_QUOTE_DEPTH.to_string()),
        }
    }
}

impl RenderedView for PageView {
    async fn current_url(&self) -> Result<String> {
        self.executor.url().await
    }

    async fn post_nodes(&self) -> Result<Vec<JsonValue>> {
        self.executor
            .eval_as(self.snapshot_script.as_str())
            .await
            .context("采集推文元素失败")
    }

    async fn scroll_to(&self, position: ScrollPosition) -> Result<()> {
        let js_code = match position {
            ScrollPosition::Top => "window.scrollTo(0, 0)",
            ScrollPosition::Bottom => "window.scrollTo(0, document.body.scrollHeight)",
        };
        self.executor
            .eval(js_code)
            .await
            .with_context(|| format!("滚动到 {:?} 失败", position))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        self.executor
            .eval_as("document.body.scrollHeight")
            .await
            .context("读取页面高度失败")
    }
}
