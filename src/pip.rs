use crate::error::Result;
use crate::utils;
use directories::BaseDirs;
use regex::Regex;
use std::path::PathBuf;
use tokio::fs;

/// pip 配置文件管理 (读取 / 应用 / 恢复)
pub struct PipConfig {
    custom_path: Option<PathBuf>,
}

impl PipConfig {
    pub fn new() -> Self {
        Self { custom_path: None }
    }

    #[cfg(test)]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            custom_path: Some(path),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(ref path) = self.custom_path {
            return path.clone();
        }

        if let Some(base_dirs) = BaseDirs::new() {
            let config_dir = base_dirs.config_dir();
            if cfg!(target_os = "windows") {
                // Windows: %APPDATA%\pip\pip.ini
                config_dir.join("pip").join("pip.ini")
            } else {
                // Linux/macOS: ~/.config/pip/pip.conf (Standard XDG)
                config_dir.join("pip").join("pip.conf")
            }
        } else {
            // Fallback
            PathBuf::from(".").join("pip.conf")
        }
    }

    /// 当前生效的 index-url (未配置则返回 None, 视为官方默认)
    pub async fn current_index_url(&self) -> Result<Option<String>> {
        let path = self.config_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;

        // 支持 index-url = https://... 或 index-url=https://...
        let re = Regex::new(r"(?m)^index-url\s*=\s*(.+)$")?;

        if let Some(caps) = re.captures(&content) {
            Ok(Some(caps[1].trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// 应用新的镜像源
    ///
    /// 1. 备份原配置文件 (如果存在)
    /// 2. 写入 index-url 与 extra-index-url, 保留其余配置项
    pub async fn apply(&self, index_url: &str, extra_index_urls: &[String]) -> Result<()> {
        let path = self.config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = if fs::try_exists(&path).await.unwrap_or(false) {
            fs::read_to_string(&path).await?
        } else {
            String::new()
        };

        if !content.is_empty() {
            utils::backup_file(&path).await?;
        }

        let mut new_content = upsert_global_key(&content, "index-url", index_url)?;
        if !extra_index_urls.is_empty() {
            // pip accepts multiple extra indexes as one space-separated value
            let joined = extra_index_urls.join(" ");
            new_content = upsert_global_key(&new_content, "extra-index-url", &joined)?;
        }

        fs::write(&path, new_content).await?;
        Ok(())
    }

    /// 恢复上一次的配置
    ///
    /// Prefers the newest backup; when none exists, strips the managed keys
    /// so pip falls back to its defaults.
    pub async fn reset(&self) -> Result<()> {
        let path = self.config_path();

        if utils::restore_latest_backup(&path).await.is_ok() {
            return Ok(());
        }

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        let content = fs::read_to_string(&path).await?;
        let re = Regex::new(r"(?m)^(?:extra-)?index-url\s*=\s*.*(?:\r?\n)?")?;
        let stripped = re.replace_all(&content, "").to_string();
        fs::write(&path, stripped).await?;

        println!("pip configuration has been reset to the default settings.");
        Ok(())
    }
}

/// 替换或插入 [global] 节下的一个键
fn upsert_global_key(content: &str, key: &str, value: &str) -> Result<String> {
    let new_line = format!("{} = {}", key, value);
    let re = Regex::new(&format!(r"(?m)^{}\s*=\s*.*$", regex::escape(key)))?;

    let updated = if re.is_match(content) {
        // 情况 A: 键已存在, 直接替换该行
        re.replace(content, new_line.as_str()).to_string()
    } else if content.contains("[global]") {
        // 情况 B: 有 [global] 节但没有这个键
        content.replace("[global]", &format!("[global]\n{}", new_line))
    } else {
        // 情况 C: 既没键也没节, 或者文件为空, 追加全部
        let prefix = if content.is_empty() { "" } else { "\n" };
        format!("{}{}[global]\n{}\n", content, prefix, new_line)
    };

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn apply_and_reset_flow() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("pip.conf");
        let pip_conf = PipConfig::with_path(config_path.clone());

        // 1. Initial state: None
        assert!(pip_conf.current_index_url().await?.is_none());

        // 2. Apply a mirror with extras
        let first = "https://test.pypi.org/simple";
        let extras = vec!["https://pypi.org/simple".to_string()];
        pip_conf.apply(first, &extras).await?;

        assert_eq!(
            pip_conf.current_index_url().await?,
            Some(first.to_string())
        );
        let content = fs::read_to_string(&config_path).await?;
        assert!(content.contains("[global]"));
        assert!(content.contains(&format!("index-url = {}", first)));
        assert!(content.contains("extra-index-url = https://pypi.org/simple"));

        // 3. Apply another mirror (a backup gets created first).
        // The backup suffix has second precision, so space the writes out.
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        let second = "https://test2.pypi.org/simple";
        pip_conf.apply(second, &extras).await?;
        assert_eq!(
            pip_conf.current_index_url().await?,
            Some(second.to_string())
        );

        // 4. Reset restores the first configuration
        pip_conf.reset().await?;
        assert_eq!(
            pip_conf.current_index_url().await?,
            Some(first.to_string())
        );

        Ok(())
    }

    #[tokio::test]
    async fn reset_without_backup_strips_managed_keys() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("pip.conf");
        let pip_conf = PipConfig::with_path(config_path.clone());

        fs::write(
            &config_path,
            "[global]\ntimeout = 60\nindex-url = https://x/simple\nextra-index-url = https://y/simple\n",
        )
        .await?;

        pip_conf.reset().await?;

        let content = fs::read_to_string(&config_path).await?;
        assert!(!content.contains("index-url"));
        assert!(content.contains("timeout = 60"));
        assert!(pip_conf.current_index_url().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn apply_preserves_unrelated_keys() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("pip.conf");
        let pip_conf = PipConfig::with_path(config_path.clone());

        fs::write(&config_path, "[global]\ntimeout = 60\n").await?;
        pip_conf.apply("https://m/simple", &[]).await?;

        let content = fs::read_to_string(&config_path).await?;
        assert!(content.contains("timeout = 60"));
        assert!(content.contains("index-url = https://m/simple"));
        Ok(())
    }

    #[tokio::test]
    async fn reset_on_a_missing_file_is_a_no_op() -> Result<()> {
        let dir = tempdir()?;
        let pip_conf = PipConfig::with_path(dir.path().join("pip.conf"));
        pip_conf.reset().await?;
        Ok(())
    }
}
