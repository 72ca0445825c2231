pub mod connection;
pub mod headless;

use std::time::Duration;

use chromiumoxide::Handler;
use futures::StreamExt;
use tokio::time::sleep;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_browser;

/// 浏览器连接建立后，等待标签页列表同步的时间
const TARGET_SYNC_DELAY: Duration = Duration::from_millis(300);

/// 在后台驱动 CDP 事件，连接断开时结束
fn drive_events(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });
}

async fn wait_for_targets() {
    sleep(TARGET_SYNC_DELAY).await;
}
