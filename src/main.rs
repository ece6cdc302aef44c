use autocurator_scan::utils::{logger, validation::Validate};
use autocurator_scan::{CdmlPipeline, CliConfig, LocalStorage, ScanEngine, ScanOptions};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting autocuratorscan");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    let options = match &config.options {
        Some(path) => match ScanOptions::from_file(path) {
            Ok(options) => options,
            Err(e) => {
                tracing::error!("❌ Failed to load options file '{}': {}", path, e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(2);
            }
        },
        None => ScanOptions::default(),
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = CdmlPipeline::new(storage, config, options);
    let engine = ScanEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(path) => {
            tracing::info!("✅ Catalog scan completed successfully!");
            println!("✅ Catalog scan completed successfully!");
            println!("📁 Output saved to: {}", path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Catalog scan failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                autocurator_scan::utils::error::ErrorSeverity::Low => 0,
                autocurator_scan::utils::error::ErrorSeverity::Medium => 2,
                autocurator_scan::utils::error::ErrorSeverity::High => 1,
                autocurator_scan::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
