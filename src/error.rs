use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 导出流程中的业务错误
///
/// 其余底层错误（浏览器、IO、JSON）统一通过 `anyhow` 携带上下文向上传递，
/// 需要区分具体情况时使用 `downcast_ref::<ExportError>()`。
#[derive(Debug, Error)]
pub enum ExportError {
    /// 当前标签页不是书签页
    #[error("当前页面不是书签页: {url}")]
    WrongPage { url: String },

    /// 已有导出任务在进行中
    #[error("已有导出任务在进行中")]
    SessionInProgress,

    /// 没有待保存的导出结果
    #[error("没有待保存的导出结果")]
    NoPendingBatch,

    /// 导出被取消
    #[error("导出已取消")]
    Cancelled,

    /// 超过单次导出的最长时间
    #[error("导出超时 (已运行 {elapsed:?})")]
    TimedOut { elapsed: Duration },

    /// 读写已导出 ID 存储失败
    #[error("存储读写失败 ({key}): {message}")]
    Storage { key: String, message: String },

    /// 写出文件失败
    #[error("写入文件失败 ({path}): {source}")]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn storage(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ExportError::Storage {
            key: key.into(),
            message: format!("{err:#}"),
        }
    }
}

/// 应用程序结果类型
pub type Result<T> = anyhow::Result<T>;
