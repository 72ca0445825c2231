//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理浏览器资源（Browser、PageView）
//! - 订阅导出消息、确认保存、Ctrl-C 取消
//!
//! ### `export_orchestrator` - 导出编排器
//! - 校验页面、保证单会话
//! - 调度抽取、核对、生成文档、保存、导入
//!
//! ## 层次关系
//!
//! ```text
//! app (浏览器 + 命令行界面)
//!     ↓ ExportMessage
//! export_orchestrator (单次导出会话)
//!     ↓
//! services (能力层：extractor / item_parser / formatter / seen_store / file_emitter)
//!     ↓
//! infrastructure (基础设施：JsExecutor / PageView)
//! ```

pub mod app;
pub mod export_orchestrator;

pub use app::{build_orchestrator, run_import, App, FileOrchestrator};
pub use export_orchestrator::{is_bookmarks_page, ExportOrchestrator, ExportOutcome};
