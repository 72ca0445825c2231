use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "bookmark_export.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口（连接已登录的浏览器）
    pub browser_debug_port: u16,
    /// 是否自行启动浏览器（否则连接调试端口）
    pub launch_browser: bool,
    /// 浏览器可执行文件路径（仅启动模式）
    pub chrome_executable: Option<String>,
    /// 浏览器用户目录，用于保留登录状态（仅启动模式）
    pub browser_profile: Option<String>,
    /// 是否无头运行（仅启动模式）
    pub headless: bool,
    /// 书签页 URL
    pub bookmarks_url: String,
    /// 导出文件目录
    pub output_dir: String,
    /// 已导出 ID 的存储文件
    pub store_path: String,
    /// 文档中是否嵌入图片
    pub include_images: bool,
    /// 预扫描每次滚动后的等待时间（毫秒）
    pub census_delay_ms: u64,
    /// 收集阶段每次滚动后的等待时间（毫秒）
    pub harvest_delay_ms: u64,
    /// 回到顶部后的等待时间（毫秒）
    pub settle_delay_ms: u64,
    /// 预扫描中页面高度连续不变多少轮视为到底
    pub census_stable_rounds: usize,
    /// 收集阶段连续多少轮没有新书签视为完成
    pub stall_retries: usize,
    /// 单次导出的最长时间（秒）
    pub max_duration_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 收集完成后是否不经确认直接保存
    pub auto_confirm: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            launch_browser: false,
            chrome_executable: None,
            browser_profile: None,
            headless: false,
            bookmarks_url: "https://x.com/i/bookmarks".to_string(),
            output_dir: "twitter_bookmarks".to_string(),
            store_path: "exported_ids.json".to_string(),
            include_images: true,
            census_delay_ms: 1500,
            harvest_delay_ms: 2500,
            settle_delay_ms: 1000,
            census_stable_rounds: 3,
            stall_retries: 5,
            max_duration_secs: 30 * 60,
            verbose_logging: false,
            auto_confirm: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件（如存在） → 环境变量
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let base = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("未找到配置文件 {}，使用默认配置", path.display());
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置，缺省字段取默认值
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        tracing::info!("已加载配置文件: {}", path.display());
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(base.browser_debug_port),
            launch_browser: env_parse("LAUNCH_BROWSER").unwrap_or(base.launch_browser),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(base.chrome_executable),
            browser_profile: std::env::var("BROWSER_PROFILE").ok().or(base.browser_profile),
            headless: env_parse("HEADLESS").unwrap_or(base.headless),
            bookmarks_url: std::env::var("BOOKMARKS_URL").unwrap_or(base.bookmarks_url),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(base.output_dir),
            store_path: std::env::var("STORE_PATH").unwrap_or(base.store_path),
            include_images: env_parse("INCLUDE_IMAGES").unwrap_or(base.include_images),
            census_delay_ms: env_parse("CENSUS_DELAY_MS").unwrap_or(base.census_delay_ms),
            harvest_delay_ms: env_parse("HARVEST_DELAY_MS").unwrap_or(base.harvest_delay_ms),
            settle_delay_ms: env_parse("SETTLE_DELAY_MS").unwrap_or(base.settle_delay_ms),
            census_stable_rounds: env_parse("CENSUS_STABLE_ROUNDS").unwrap_or(base.census_stable_rounds),
            stall_retries: env_parse("STALL_RETRIES").unwrap_or(base.stall_retries),
            max_duration_secs: env_parse("MAX_DURATION_SECS").unwrap_or(base.max_duration_secs),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(base.verbose_logging),
            auto_confirm: env_parse("AUTO_CONFIRM").unwrap_or(base.auto_confirm),
        }
    }

    pub fn census_delay(&self) -> Duration {
        Duration::from_millis(self.census_delay_ms)
    }

    pub fn harvest_delay(&self) -> Duration {
        Duration::from_millis(self.harvest_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            stall_retries = 8
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.stall_retries, 8);
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.census_stable_rounds, 3);
        assert_eq!(config.harvest_delay(), Duration::from_millis(2500));
    }
}
