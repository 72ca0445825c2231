use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use tracing::{debug, info, warn};

use super::{drive_events, wait_for_targets};

/// 连接已开启远程调试的浏览器
///
/// 优先复用 URL 包含 `url_hint` 的已打开标签页（沿用登录状态和滚动位置），
/// 没有匹配的标签页时新开一个并导航到 `target_url`。
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: &str,
    url_hint: Option<&str>,
) -> Result<(Browser, Page)> {
    let endpoint = format!("http://localhost:{}", port);
    info!("🔌 连接浏览器调试端口: {}", endpoint);

    let (browser, handler) = Browser::connect(&endpoint).await.with_context(|| {
        format!(
            "无法连接浏览器 {}，请确认已使用 --remote-debugging-port={} 启动",
            endpoint, port
        )
    })?;
    drive_events(handler);
    wait_for_targets().await;

    if let Some(hint) = url_hint {
        match find_tab(&browser, hint).await {
            Ok(Some(page)) => return Ok((browser, page)),
            Ok(None) => debug!("没有 URL 包含 '{}' 的标签页，新开页面", hint),
            Err(e) => warn!("⚠️ 枚举标签页失败，新开页面: {:#}", e),
        }
    }

    let page = browser
        .new_page(target_url)
        .await
        .with_context(|| format!("无法打开页面: {}", target_url))?;
    info!("✓ 已打开新标签页: {}", target_url);

    Ok((browser, page))
}

async fn find_tab(browser: &Browser, hint: &str) -> Result<Option<Page>> {
    let pages = browser.pages().await?;
    debug!("浏览器共有 {} 个标签页", pages.len());

    for page in pages {
        let Ok(Some(url)) = page.url().await else {
            continue;
        };
        if url.contains(hint) {
            info!("✓ 复用已打开的标签页: {}", url);
            return Ok(Some(page));
        }
    }
    Ok(None)
}
