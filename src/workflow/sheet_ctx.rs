//! 答题卡处理上下文
//!
//! 封装"我正在处理这一批的第几张卡、卡来自哪个文件"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 答题卡处理上下文
#[derive(Debug, Clone)]
pub struct SheetCtx {
    /// 图片路径
    pub path: PathBuf,

    /// 在本批中的序号（从1开始，仅用于日志显示）
    pub sheet_index: usize,
}

impl SheetCtx {
    pub fn new(path: impl Into<PathBuf>, sheet_index: usize) -> Self {
        Self {
            path: path.into(),
            sheet_index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 图片文件名（写进结果的 source 字段）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// 不带扩展名的文件名（区域裁剪图的子目录名）
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("sheet-{}", self.sheet_index))
    }
}

impl Display for SheetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[答题卡 {}]", self.sheet_index)
    }
}
