use crate::error::{AppError, FileError};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_sheet_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 列出文件夹中的答题卡图片，按文件名排序
pub async fn list_sheet_images(folder_path: &Path) -> Result<Vec<PathBuf>> {
    if !folder_path.exists() {
        return Err(AppError::from(FileError::DirectoryNotFound {
            path: folder_path.display().to_string(),
        })
        .into());
    }

    let mut images = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_sheet_image(&path) {
            images.push(path);
        }
    }

    if images.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到答题卡图片", folder_path.display());
    }

    images.sort();
    Ok(images)
}
