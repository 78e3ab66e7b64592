use crate::core::generator::generate;
use crate::core::{BankStorage, ConfigProvider};
use crate::domain::model::{BankEntry, GeneratedItem, Template, Value};
use crate::utils::error::{ItemGenError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// 報表最多列出的失敗筆數
pub const MAX_REPORTED_FAILURES: usize = 50;

/// 失敗時帶回造成失敗的種子 (模板本身不合法時為空字串)
type EntryOutcome = std::result::Result<(), (String, ItemGenError)>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationFailure {
    pub file: String,
    pub id: Option<String>,
    pub seed: Option<String>,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ValidationReport {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SnapshotRecord {
    Generated {
        file: String,
        id: Option<String>,
        stem: String,
        answer: Value,
        distractors: Vec<Value>,
    },
    Failed {
        file: String,
        id: Option<String>,
        error: String,
    },
}

/// 以題庫為單位批次驅動生成器：驗證每個模板、或產生快照
pub struct BatchEngine<S: BankStorage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: BankStorage, C: ConfigProvider> BatchEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    /// 依設定載入題庫；未指定檔案時使用全部 `*.json`
    pub async fn load_banks(&self) -> Result<Vec<(String, Vec<BankEntry>)>> {
        let names = if self.config.bank_files().is_empty() {
            self.storage.list_banks().await?
        } else {
            self.config.bank_files().to_vec()
        };

        let mut banks = Vec::with_capacity(names.len());
        for name in names {
            let entries = self.storage.read_bank(&name).await?;
            tracing::debug!("Loaded {} entries from {}", entries.len(), name);
            banks.push((name, entries));
        }
        Ok(banks)
    }

    /// 從指定題庫取出單一條目並生成
    pub async fn generate_entry(&self, file: &str, id: &str, seed: &str) -> Result<GeneratedItem> {
        let entries = self.storage.read_bank(file).await?;
        let entry = entries
            .iter()
            .find(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| ItemGenError::BankError {
                file: file.to_string(),
                message: format!("no entry with id '{}'", id),
            })?;
        let template = require_template(entry)?;
        tracing::debug!("Generating '{}' from {} with seed '{}'", id, file, seed);
        generate(&template, seed)
    }

    pub async fn validate(&self) -> Result<ValidationReport> {
        let banks = self.load_banks().await?;
        let suffixes: Arc<Vec<String>> = Arc::new(self.config.seed_suffixes().to_vec());
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency().max(1)));

        tracing::info!(
            "Validating {} bank file(s) with concurrency {}",
            banks.len(),
            self.config.concurrency()
        );

        let mut handles: Vec<(String, Option<String>, JoinHandle<EntryOutcome>)> = Vec::new();
        for (file, entries) in banks {
            for entry in entries {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| ItemGenError::TaskError {
                        message: e.to_string(),
                    })?;
                let suffixes = Arc::clone(&suffixes);
                let id = entry.id.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    validate_entry(&entry, &suffixes)
                });
                handles.push((file.clone(), id, handle));
            }
        }

        let mut report = ValidationReport::default();
        for (file, id, handle) in handles {
            report.total += 1;
            let outcome = handle.await.map_err(|e| ItemGenError::TaskError {
                message: e.to_string(),
            })?;
            match outcome {
                Ok(()) => report.passed += 1,
                Err((seed, e)) => {
                    tracing::debug!(
                        "[{}] {} failed with seed '{}': {}",
                        file,
                        id.as_deref().unwrap_or("<no id>"),
                        seed,
                        e
                    );
                    report.failures.push(ValidationFailure {
                        file,
                        id,
                        seed: Some(seed).filter(|s| !s.is_empty()),
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("{}/{} templates validated", report.passed, report.total);
        Ok(report)
    }

    /// 快照種子前綴：設定值優先，否則為當天 UTC 日期 (YYYY-MM-DD)
    pub fn seed_prefix(&self) -> String {
        match self.config.seed_prefix() {
            Some(prefix) => prefix.to_string(),
            None => chrono::Utc::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// 每個題庫取前 N 筆，以 `<prefix>-<id>` 作為種子生成
    pub async fn snapshot(&self, seed_prefix: &str) -> Result<Vec<SnapshotRecord>> {
        let banks = self.load_banks().await?;
        let per_file = self.config.snapshot_per_file();
        let mut records = Vec::new();

        for (file, entries) in banks {
            for entry in entries.into_iter().take(per_file) {
                let id = entry.id.clone();
                let seed = format!("{}-{}", seed_prefix, id.as_deref().unwrap_or("undefined"));
                let outcome = require_template(&entry).and_then(|t| generate(&t, &seed));
                records.push(match outcome {
                    Ok(item) => SnapshotRecord::Generated {
                        file: file.clone(),
                        id,
                        stem: item.stem,
                        answer: item.answer,
                        distractors: item.distractors,
                    },
                    Err(e) => {
                        tracing::warn!(
                            "Snapshot of {} in {} failed: {}",
                            id.as_deref().unwrap_or("<no id>"),
                            file,
                            e
                        );
                        SnapshotRecord::Failed {
                            file: file.clone(),
                            id,
                            error: e.to_string(),
                        }
                    }
                });
            }
        }

        Ok(records)
    }

    /// 產生快照並寫入設定的輸出路徑，回傳輸出路徑
    pub async fn write_snapshot(&self, seed_prefix: &str) -> Result<String> {
        let records = self.snapshot(seed_prefix).await?;
        let json = serde_json::to_vec_pretty(&records)?;
        let output = self.config.snapshot_output().to_string();
        self.storage.write_file(&output, &json).await?;
        tracing::info!("Wrote {} snapshot record(s) to {}", records.len(), output);
        Ok(output)
    }
}

/// 取出條目中的模板；沒有 id 的模板以條目 id 命名
fn require_template(entry: &BankEntry) -> Result<Template> {
    let invalid = |reason: String| ItemGenError::InvalidTemplate {
        template_id: entry.id.clone().unwrap_or_else(|| "<no id>".to_string()),
        reason,
    };
    let mut template = match entry.parse_template() {
        Ok(Some(t)) if !t.stem.trim().is_empty() => t,
        Ok(_) => return Err(invalid("missing template.stem".to_string())),
        Err(e) => return Err(invalid(format!("malformed template: {}", e))),
    };
    if template.id.is_none() {
        template.id = entry.id.clone();
    }
    Ok(template)
}

/// 以每個種子後綴各生成一次；沒有 id 時依序使用 seedA、seedB ...
fn validate_entry(entry: &BankEntry, suffixes: &[String]) -> EntryOutcome {
    let template = require_template(entry).map_err(|e| (String::new(), e))?;
    for (index, suffix) in suffixes.iter().enumerate() {
        let base = match &entry.id {
            Some(id) => id.clone(),
            None => format!("seed{}", (b'A' + (index % 26) as u8) as char),
        };
        let seed = format!("{}{}", base, suffix);
        generate(&template, &seed).map_err(|e| (seed.clone(), e))?;
    }
    Ok(())
}
