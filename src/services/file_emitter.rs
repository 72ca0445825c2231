//! 文件输出服务 - 业务能力层
//!
//! 只负责把文档写到磁盘，失败以错误返回，由编排层转成状态消息。

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::ExportError;

/// 文件输出
#[allow(async_fn_in_trait)]
pub trait FileEmitter {
    /// 写出文档，返回实际写入的路径
    async fn emit(&self, document: &str, file_name: &str) -> Result<PathBuf>;
}

/// 写入指定目录，同名文件已存在时追加序号，不覆盖旧的导出
#[derive(Debug, Clone)]
pub struct DirectoryEmitter {
    dir: PathBuf,
}

impl DirectoryEmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidate(&self, file_name: &str, attempt: usize) -> PathBuf {
        if attempt == 0 {
            return self.dir.join(file_name);
        }
        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{}_{}.{}", stem, attempt, ext.to_string_lossy()),
            None => format!("{}_{}", stem, attempt),
        };
        self.dir.join(name)
    }

    async fn write_new(&self, document: &str, file_name: &str) -> std::result::Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ExportError::Emit {
                path: self.dir.clone(),
                source,
            })?;

        let mut attempt = 0;
        loop {
            let path = self.candidate(file_name, attempt);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    let written = async {
                        file.write_all(document.as_bytes()).await?;
                        file.flush().await
                    }
                    .await;
                    return match written {
                        Ok(()) => Ok(path),
                        Err(source) => {
                            // 写入失败时不留下残缺文件
                            let _ = fs::remove_file(&path).await;
                            Err(ExportError::Emit { path, source })
                        }
                    };
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("文件已存在，尝试下一个文件名: {}", path.display());
                    attempt += 1;
                }
                Err(source) => return Err(ExportError::Emit { path, source }),
            }
        }
    }
}

impl FileEmitter for DirectoryEmitter {
    async fn emit(&self, document: &str, file_name: &str) -> Result<PathBuf> {
        let path = self.write_new(document, file_name).await?;
        info!("📄 已写入导出文件: {}", path.display());
        Ok(path)
    }
}
