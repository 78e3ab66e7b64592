use crate::core::ConfigProvider;
use crate::utils::error::{ItemGenError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub bank: BankConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub files: Vec<String>, // 空集合 = 資料夾中所有 *.json
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateConfig {
    #[serde(default = "default_seed_suffixes")]
    pub seed_suffixes: Vec<String>, // 每個模板以 <id><suffix> 各生成一次
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_per_file")]
    pub per_file: usize,
    #[serde(default = "default_output")]
    pub output: String,
    pub seed_prefix: Option<String>, // 未設定時使用當天日期
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_seed_suffixes() -> Vec<String> {
    vec![String::new(), "-B".to_string()]
}

fn default_concurrency() -> usize {
    4
}

fn default_per_file() -> usize {
    5
}

fn default_output() -> String {
    "SNAPSHOT.json".to_string()
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            files: Vec::new(),
        }
    }
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            seed_suffixes: default_seed_suffixes(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            per_file: default_per_file(),
            output: default_output(),
            seed_prefix: None,
        }
    }
}

impl RunConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ItemGenError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ItemGenError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BANK_DIR})；未定義的變數原樣保留
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_bank_selection(&self.bank.data_dir, &self.bank.files)?;
        validation::validate_seed_suffixes(&self.validate.seed_suffixes)?;
        validation::validate_concurrency(self.validate.concurrency)?;
        validation::validate_snapshot_settings(
            self.snapshot.per_file,
            &self.snapshot.output,
            self.snapshot.seed_prefix.as_deref(),
        )
    }
}

impl ConfigProvider for RunConfig {
    fn bank_files(&self) -> &[String] {
        &self.bank.files
    }

    fn concurrency(&self) -> usize {
        self.validate.concurrency
    }

    fn seed_suffixes(&self) -> &[String] {
        &self.validate.seed_suffixes
    }

    fn snapshot_per_file(&self) -> usize {
        self.snapshot.per_file
    }

    fn snapshot_output(&self) -> &str {
        &self.snapshot.output
    }

    fn seed_prefix(&self) -> Option<&str> {
        self.snapshot.seed_prefix.as_deref()
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[bank]
data_dir = "./banks"
files = ["MASTER_HOA_SAT.json", "MASTER_PAM_SAT.json"]

[validate]
seed_suffixes = ["", "-B", "-C"]
concurrency = 8

[snapshot]
per_file = 3
output = "out/SNAPSHOT.json"
seed_prefix = "2024-01-01"
"#;

        let config = RunConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bank.data_dir, "./banks");
        assert_eq!(config.bank_files().len(), 2);
        assert_eq!(config.seed_suffixes().len(), 3);
        assert_eq!(config.concurrency(), 8);
        assert_eq!(config.snapshot_per_file(), 3);
        assert_eq!(config.seed_prefix(), Some("2024-01-01"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_empty_config() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config.bank.data_dir, "data");
        assert!(config.bank_files().is_empty());
        assert_eq!(config.seed_suffixes(), &["".to_string(), "-B".to_string()]);
        assert_eq!(config.snapshot_per_file(), 5);
        assert_eq!(config.snapshot_output(), "SNAPSHOT.json");
        assert_eq!(config.seed_prefix(), None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ITEMGEN_TEST_BANK_DIR", "/srv/banks");

        let toml_content = r#"
[bank]
data_dir = "${ITEMGEN_TEST_BANK_DIR}"
"#;

        let config = RunConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.bank.data_dir, "/srv/banks");

        std::env::remove_var("ITEMGEN_TEST_BANK_DIR");
    }

    #[test]
    fn test_config_validation() {
        let config = RunConfig::from_toml_str(
            r#"
[bank]
files = ["bank.csv"]
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = RunConfig::from_toml_str("[validate]\nconcurrency = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = RunConfig::from_toml_str("[validate]\nseed_suffixes = []\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ItemGenError::MissingConfigError { .. })
        ));

        let config = RunConfig::from_toml_str("[bank]\nfiles = [\"../escape.json\"]\n").unwrap();
        assert!(config.validate().is_err());

        let config = RunConfig::from_toml_str("[snapshot]\noutput = \"snapshot.csv\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[snapshot]\nper_file = 2\n")
            .unwrap();

        let config = RunConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.snapshot_per_file(), 2);
    }
}
