use crate::utils::error::{ItemGenError, Result};
use std::collections::HashSet;
use std::path::{Component, Path};

/// 同時進行的生成工作上限
pub const MAX_CONCURRENCY: usize = 256;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ItemGenError {
    ItemGenError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// 題庫資料夾與明確指定的題庫檔。
/// 檔案相對於 `data_dir` 讀取，因此不可為絕對路徑或跳出資料夾
pub fn validate_bank_selection(data_dir: &str, files: &[String]) -> Result<()> {
    if data_dir.trim().is_empty() || data_dir.contains('\0') {
        return Err(invalid("bank.data_dir", data_dir, "must name a directory"));
    }

    let mut seen = HashSet::new();
    for file in files {
        let path = Path::new(file);
        if !is_json_file(path) {
            return Err(invalid("bank.files", file, "bank files must be .json"));
        }
        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(invalid("bank.files", file, "must stay inside bank.data_dir"));
        }
        if !seen.insert(file.as_str()) {
            return Err(invalid("bank.files", file, "listed more than once"));
        }
    }
    Ok(())
}

/// 每個後綴各生成一次；重複的後綴只會重跑同一個種子
pub fn validate_seed_suffixes(suffixes: &[String]) -> Result<()> {
    if suffixes.is_empty() {
        return Err(ItemGenError::MissingConfigError {
            field: "validate.seed_suffixes".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for suffix in suffixes {
        if !seen.insert(suffix.as_str()) {
            return Err(invalid("validate.seed_suffixes", suffix, "duplicate seed suffix"));
        }
    }
    Ok(())
}

pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
        return Err(ItemGenError::InvalidConfigValueError {
            field: "validate.concurrency".to_string(),
            value: concurrency.to_string(),
            reason: format!("must be between 1 and {}", MAX_CONCURRENCY),
        });
    }
    Ok(())
}

pub fn validate_snapshot_settings(per_file: usize, output: &str, seed_prefix: Option<&str>) -> Result<()> {
    if per_file == 0 {
        return Err(invalid("snapshot.per_file", per_file, "must take at least one entry per bank"));
    }
    if output.contains('\0') || !is_json_file(Path::new(output)) {
        return Err(invalid("snapshot.output", output, "snapshot output must be a .json file"));
    }
    if let Some(prefix) = seed_prefix {
        if prefix.trim().is_empty() {
            return Err(invalid("snapshot.seed_prefix", prefix, "leave unset to use today's date"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_bank_selection() {
        assert!(validate_bank_selection("./data", &[]).is_ok());
        assert!(validate_bank_selection("data", &files(&["MASTER_HOA_SAT.json", "sat/extra.JSON"])).is_ok());

        assert!(validate_bank_selection("  ", &[]).is_err());
        assert!(validate_bank_selection("data", &files(&["bank.yaml"])).is_err());
        assert!(validate_bank_selection("data", &files(&["README"])).is_err());
        assert!(validate_bank_selection("data", &files(&["../other/bank.json"])).is_err());
        assert!(validate_bank_selection("data", &files(&["/etc/bank.json"])).is_err());
        assert!(validate_bank_selection("data", &files(&["a.json", "a.json"])).is_err());
    }

    #[test]
    fn test_seed_suffixes() {
        assert!(validate_seed_suffixes(&files(&["", "-B"])).is_ok());
        assert!(matches!(
            validate_seed_suffixes(&[]),
            Err(ItemGenError::MissingConfigError { .. })
        ));
        assert!(validate_seed_suffixes(&files(&["-B", "-B"])).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        assert!(validate_concurrency(1).is_ok());
        assert!(validate_concurrency(MAX_CONCURRENCY).is_ok());
        assert!(validate_concurrency(0).is_err());
        assert!(validate_concurrency(MAX_CONCURRENCY + 1).is_err());
    }

    #[test]
    fn test_snapshot_settings() {
        assert!(validate_snapshot_settings(5, "SNAPSHOT.json", None).is_ok());
        assert!(validate_snapshot_settings(1, "out/snap.json", Some("2024-01-01")).is_ok());

        assert!(validate_snapshot_settings(0, "SNAPSHOT.json", None).is_err());
        assert!(validate_snapshot_settings(5, "SNAPSHOT.txt", None).is_err());
        assert!(validate_snapshot_settings(5, "", None).is_err());
        assert!(validate_snapshot_settings(5, "SNAPSHOT.json", Some(" ")).is_err());
    }
}
