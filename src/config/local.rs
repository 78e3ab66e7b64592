use crate::core::BankStorage;
use crate::domain::model::BankEntry;
use crate::utils::error::{ItemGenError, Result};
use std::path::{Path, PathBuf};

/// 本機資料夾中的題庫檔
#[derive(Debug, Clone)]
pub struct LocalBankStorage {
    data_dir: PathBuf,
}

impl LocalBankStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl BankStorage for LocalBankStorage {
    async fn list_banks(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read_bank(&self, name: &str) -> Result<Vec<BankEntry>> {
        let content = tokio::fs::read_to_string(self.data_dir.join(name)).await?;
        serde_json::from_str(&content).map_err(|e| ItemGenError::BankError {
            file: name.to_string(),
            message: e.to_string(),
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(path);

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}
