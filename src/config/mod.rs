pub mod local;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "itemgen")]
#[command(about = "Seeded practice-question generator and question bank validator")]
pub struct CliConfig {
    /// Path to a TOML run configuration
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate one item from a bank entry and print it as JSON
    Generate {
        /// Bank file (JSON array of {id, template})
        #[arg(long)]
        bank: String,

        /// Entry id inside the bank
        #[arg(long)]
        id: String,

        #[arg(long, default_value = "demo")]
        seed: String,
    },

    /// Generate every template twice and report failures
    Validate {
        #[arg(long)]
        data_dir: Option<String>,

        #[arg(long, value_delimiter = ',')]
        files: Vec<String>,

        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Write a snapshot of the first entries of each bank
    Snapshot {
        #[arg(long)]
        data_dir: Option<String>,

        #[arg(long)]
        per_file: Option<usize>,

        /// Seed prefix (defaults to today's UTC date)
        #[arg(long)]
        seed_prefix: Option<String>,

        #[arg(long)]
        output: Option<String>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列參數覆蓋 TOML 設定
    pub fn apply_overrides(&self, config: &mut toml_config::RunConfig) {
        match &self.command {
            Command::Generate { .. } => {}
            Command::Validate {
                data_dir,
                files,
                concurrency,
            } => {
                if let Some(dir) = data_dir {
                    config.bank.data_dir = dir.clone();
                }
                if !files.is_empty() {
                    config.bank.files = files.clone();
                }
                if let Some(n) = concurrency {
                    config.validate.concurrency = *n;
                }
            }
            Command::Snapshot {
                data_dir,
                per_file,
                seed_prefix,
                output,
            } => {
                if let Some(dir) = data_dir {
                    config.bank.data_dir = dir.clone();
                }
                if let Some(n) = per_file {
                    config.snapshot.per_file = *n;
                }
                if let Some(prefix) = seed_prefix {
                    config.snapshot.seed_prefix = Some(prefix.clone());
                }
                if let Some(path) = output {
                    config.snapshot.output = path.clone();
                }
            }
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::config::toml_config::RunConfig;

    #[test]
    fn test_validate_overrides() {
        let cli = CliConfig::parse_from([
            "itemgen",
            "validate",
            "--data-dir",
            "banks",
            "--files",
            "a.json,b.json",
            "--concurrency",
            "2",
        ]);
        let mut config = RunConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.bank.data_dir, "banks");
        assert_eq!(config.bank.files, vec!["a.json", "b.json"]);
        assert_eq!(config.validate.concurrency, 2);
    }

    #[test]
    fn test_snapshot_overrides_keep_unset_values() {
        let cli = CliConfig::parse_from(["itemgen", "--verbose", "snapshot", "--per-file", "1"]);
        let mut config = RunConfig::default();
        cli.apply_overrides(&mut config);

        assert!(cli.verbose);
        assert_eq!(config.snapshot.per_file, 1);
        assert_eq!(config.snapshot.output, "SNAPSHOT.json");
        assert_eq!(config.snapshot.seed_prefix, None);
    }

    #[test]
    fn test_generate_defaults_seed() {
        let cli = CliConfig::parse_from(["itemgen", "generate", "--bank", "data/x.json", "--id", "q1"]);
        match cli.command {
            Command::Generate { seed, .. } => assert_eq!(seed, "demo"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
