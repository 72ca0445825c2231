//! 页面脚本执行 - 基础设施层
//!
//! 唯一持有 `Page` 的地方，上层只能通过脚本读取或操作页面。

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::utils::truncate_text;

pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 当前地址，页面尚未导航时为空串
    pub async fn url(&self) -> Result<String> {
        let url = self.page.url().await.context("读取页面地址失败")?;
        Ok(url.unwrap_or_default())
    }

    /// 执行脚本，返回表达式的 JSON 值（`undefined` 视为 `Null`）
    pub async fn eval(&self, script: impl Into<String>) -> Result<JsonValue> {
        let script = script.into();
        let evaluation = self
            .page
            .evaluate(script.clone())
            .await
            .with_context(|| format!("页面脚本执行失败: {}", truncate_text(&script, 40)))?;
        Ok(evaluation.into_value().unwrap_or(JsonValue::Null))
    }

    /// 执行脚本并反序列化结果
    pub async fn eval_as<T: DeserializeOwned>(&self, script: impl Into<String>) -> Result<T> {
        let value = self.eval(script).await?;
        serde_json::from_value(value).context("页面脚本返回值结构不符")
    }
}
