//! 导出流程消息
//!
//! 界面与编排层之间的全部消息都在这个封闭枚举中：
//! 控制（开始 / 保存）、进度、状态和数据。

use tokio::sync::mpsc;

use crate::models::Item;

#[derive(Debug, Clone, PartialEq)]
pub enum ExportMessage {
    /// 界面请求开始导出（需校验当前页面）
    StartExport,
    /// 页面内直接开始导出（调用方已处于书签页）
    StartExportInPage,
    /// 进度：已处理数量 / 总数
    Progress {
        processed: usize,
        total: usize,
        status: String,
    },
    /// 普通状态文本
    Status(String),
    /// 完成（终止消息）
    Complete(String),
    /// 失败（终止消息）
    Error(String),
    /// 本次收集到的新书签
    ExportData(Vec<Item>),
    /// 用户确认保存
    SaveFile,
}

impl ExportMessage {
    /// 是否为一次操作的终止消息
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportMessage::Complete(_) | ExportMessage::Error(_))
    }
}

/// 消息发送端
///
/// 发送即忘：接收端已关闭时直接丢弃，不阻塞采集循环。
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ExportMessage>>,
}

impl EventSink {
    /// 创建消息通道
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExportMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// 不接收任何消息的发送端
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, message: ExportMessage) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(message);
        }
    }

    pub fn progress(&self, processed: usize, total: usize, status: impl Into<String>) {
        self.emit(ExportMessage::Progress {
            processed,
            total,
            status: status.into(),
        });
    }

    pub fn status(&self, text: impl Into<String>) {
        self.emit(ExportMessage::Status(text.into()));
    }

    pub fn complete(&self, text: impl Into<String>) {
        self.emit(ExportMessage::Complete(text.into()));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.emit(ExportMessage::Error(text.into()));
    }
}
