use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use tracing::{debug, info};

use super::{drive_events, wait_for_targets};
use crate::config::Config;

/// 启动新的浏览器实例并打开 `url`
///
/// 书签页需要登录：配置 `browser_profile` 可复用已登录的用户目录，
/// 否则首次运行需在有界面的窗口中手动登录。
pub async fn launch_browser(config: &Config, url: &str) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器 (无头: {})", config.headless);

    let mut builder = BrowserConfig::builder().args(vec![
        "--disable-blink-features=AutomationControlled",
        "--disable-dev-shm-usage",
    ]);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(Path::new(executable));
    }
    if let Some(profile) = &config.browser_profile {
        debug!("浏览器用户目录: {}", profile);
        builder = builder.user_data_dir(profile);
    }
    let browser_config = builder
        .build()
        .map_err(|e| anyhow!("浏览器参数无效: {}", e))?;

    let (browser, handler) = Browser::launch(browser_config)
        .await
        .context("启动浏览器失败")?;
    drive_events(handler);
    wait_for_targets().await;

    let page = browser
        .new_page(url)
        .await
        .with_context(|| format!("无法打开页面: {}", url))?;
    info!("✓ 已打开: {}", url);

    Ok((browser, page))
}
