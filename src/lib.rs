//! # Bookmark Export
//!
//! 从浏览器中已渲染的书签时间线增量导出推文为 Markdown 文档
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `RenderedView` / `PageView` - 读取推文元素、滚动、读取页面高度
//!
//! ### ② 业务能力层（Services）
//! - `ItemParser` - 单个元素快照 → 推文
//! - `Extractor` - 预扫描 + 收集两阶段滚动抽取
//! - `MarkdownFormatter` - 推文列表 → 文档
//! - `SeenStore` - 已导出记录的持久化
//! - `FileEmitter` - 写出文档
//!
//! ### ③ 流程层（Workflow）
//! - `ExportMessage` / `EventSink` - 界面与编排层之间的消息
//! - `ExportSession` - 待保存的导出结果
//! - `reconcile` - 与已导出记录二次核对
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/export_orchestrator` - 单次导出会话
//! - `orchestrator/app` - 浏览器与命令行界面

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ExportError, Result};
pub use infrastructure::{JsExecutor, PageView, RenderedView, ScrollPosition};
pub use models::{Item, SeenSet};
pub use orchestrator::{App, ExportOrchestrator, ExportOutcome};
pub use workflow::{EventSink, ExportMessage, ExportSession};
