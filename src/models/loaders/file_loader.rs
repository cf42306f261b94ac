use crate::models::upload_file::UploadFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从磁盘读取单个文件
pub async fn load_upload_file(path: &Path) -> Result<UploadFile> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("无法获取文件名: {}", path.display()))?;

    Ok(UploadFile::new(filename, bytes))
}

/// 读取一组路径，目录展开为其中的普通文件（不递归）
///
/// 单个路径或文件读取失败只记录警告，不影响其余文件。
pub async fn load_upload_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();

    for path in paths {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("⚠️ 跳过不存在的路径 {}: {}", path.display(), e);
                continue;
            }
        };

        let targets = if metadata.is_dir() {
            match list_dir_files(path).await {
                Ok(targets) => targets,
                Err(e) => {
                    tracing::warn!("⚠️ 跳过无法读取的文件夹 {}: {:#}", path.display(), e);
                    continue;
                }
            }
        } else {
            vec![path.clone()]
        };

        for target in targets {
            tracing::info!(
                "正在加载: {}",
                target.file_name().unwrap_or_default().to_string_lossy()
            );
            match load_upload_file(&target).await {
                Ok(file) => files.push(file),
                Err(e) => tracing::warn!("加载文件失败 {}: {:#}", target.display(), e),
            }
        }
    }

    Ok(files)
}

async fn list_dir_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到文件", folder.display());
    }

    Ok(files)
}
