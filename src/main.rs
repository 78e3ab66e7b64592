use clap::Parser;
use itemgen::config::Command;
use itemgen::core::batch::MAX_REPORTED_FAILURES;
use itemgen::utils::error::ErrorSeverity;
use itemgen::utils::{logger, validation::Validate};
use itemgen::{BatchEngine, CliConfig, ItemGenError, LocalBankStorage, RunConfig};
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "itemgen.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting itemgen");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match &cli.command {
        Command::Generate { bank, id, seed } => {
            let path = Path::new(bank);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("invalid bank path: {}", bank))?;

            let engine = BatchEngine::new(LocalBankStorage::new(dir), config.clone());
            match engine.generate_entry(file, id, seed).await {
                Ok(item) => println!("{}", serde_json::to_string_pretty(&item)?),
                Err(e) => exit_with(&e, id, seed),
            }
        }
        Command::Validate { .. } => {
            let storage = LocalBankStorage::new(&config.bank.data_dir);
            let engine = BatchEngine::new(storage, config.clone());
            let report = match engine.validate().await {
                Ok(report) => report,
                Err(e) => exit_with(&e, "<bank>", "-"),
            };

            if report.is_success() {
                println!("✅ All good: {}/{} templates validated.", report.passed, report.total);
            } else {
                eprintln!("❌ Validation failed.");
                for failure in report.failures.iter().take(MAX_REPORTED_FAILURES) {
                    eprintln!(
                        "- [{}] {} → {}: {}",
                        failure.file,
                        failure.id.as_deref().unwrap_or("<no id>"),
                        failure.kind,
                        failure.message
                    );
                }
                eprintln!(
                    "\n{}/{} passed; {} failed.",
                    report.passed,
                    report.total,
                    report.failures.len()
                );
                std::process::exit(1);
            }
        }
        Command::Snapshot { .. } => {
            let storage = LocalBankStorage::new(&config.bank.data_dir);
            let engine = BatchEngine::new(storage, config.clone());
            let seed_prefix = engine.seed_prefix();
            tracing::info!("📸 Snapshot seed prefix: {}", seed_prefix);

            match engine.write_snapshot(&seed_prefix).await {
                Ok(output) => println!("Wrote {}", output),
                Err(e) => exit_with(&e, "<bank>", &seed_prefix),
            }
        }
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> itemgen::Result<RunConfig> {
    match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            RunConfig::from_file(path)
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            tracing::info!("📁 Loading configuration from: {}", DEFAULT_CONFIG_FILE);
            RunConfig::from_file(DEFAULT_CONFIG_FILE)
        }
        None => Ok(RunConfig::default()),
    }
}

/// 記錄錯誤並依嚴重程度決定退出碼
fn exit_with(e: &ItemGenError, template_id: &str, seed: &str) -> ! {
    tracing::error!(
        template_id,
        seed,
        error_kind = e.kind(),
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
