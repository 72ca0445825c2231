//! 启动与导出统计的日志输出

use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 书签导出模式");
    if config.launch_browser {
        info!("🌐 浏览器: 启动新实例 (无头: {})", config.headless);
    } else {
        info!("🌐 浏览器: 连接调试端口 {}", config.browser_debug_port);
    }
    info!("📁 输出目录: {}", config.output_dir);
    info!("🗂️ 已导出记录: {}", config.store_path);
    info!("{}", "=".repeat(60));
}

/// 记录保存后的统计
pub fn log_export_summary(saved: usize, known: usize) {
    info!("{}", "─".repeat(60));
    info!("📊 本次导出: {} 条新书签", saved);
    info!("🗂️ 已导出记录累计: {} 条", known);
    info!("🕒 {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "─".repeat(60));
}

/// 单行预览：换行折叠为空格，超过 `max_chars` 个字符时截断
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let line: String = text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    match line.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line,
    }
}
