use crate::error::{MirrorError, Result};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// 备份文件 (如果有)
/// 文件名格式: pip.conf -> pip.conf.bak.TIMESTAMP
pub async fn backup_file(path: &Path) -> Result<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        let backup_name = format!("{}.bak.{}", file_name, timestamp);
        let backup_path = path.with_file_name(backup_name);

        fs::copy(path, &backup_path).await?;
        println!("Backup created at: {:?}", backup_path);
    }
    Ok(())
}

/// 恢复到最近的备份
pub async fn restore_latest_backup(path: &Path) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let prefix = format!("{}.bak.", file_name);

    if !fs::try_exists(parent).await.unwrap_or(false) {
        return Err(MirrorError::Custom(format!(
            "Directory not found: {:?}",
            parent
        )));
    }

    let mut entries = fs::read_dir(parent).await?;
    let mut backups = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) {
            backups.push(entry.path());
        }
    }

    if backups.is_empty() {
        return Err(MirrorError::Custom("No backup files found.".to_string()));
    }

    // Sort by path string (effectively sorting by timestamp suffix)
    backups.sort();

    let latest = backups.last().ok_or_else(|| {
        MirrorError::Custom("No backup files found.".to_string())
    })?;

    println!("Restoring from backup: {:?}", latest);
    fs::copy(latest, path).await?;
    println!("Successfully restored configuration.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn backup_then_restore_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("pip.conf");

        fs::write(&path, "original").await?;
        backup_file(&path).await?;

        fs::write(&path, "modified").await?;
        restore_latest_backup(&path).await?;

        assert_eq!(fs::read_to_string(&path).await?, "original");
        Ok(())
    }

    #[tokio::test]
    async fn restore_without_backup_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pip.conf");
        assert!(restore_latest_backup(&path).await.is_err());
    }

    #[tokio::test]
    async fn backing_up_a_missing_file_is_a_no_op() -> Result<()> {
        let dir = tempdir()?;
        backup_file(&dir.path().join("absent.conf")).await?;
        Ok(())
    }
}
