use anp_etl::config::Command;
use anp_etl::core::ConfigProvider;
use anp_etl::utils::error::ErrorSeverity;
use anp_etl::utils::{logger, validation::Validate};
use anp_etl::{
    filter_options, CatalogDiscoverer, CliConfig, EtlEngine, EtlError, FilterCriteria,
    LocalStorage, ProductionPipeline, TomlConfig,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting anp-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = execute(&cli.command, config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(exit_code(e.severity()));
    }

    Ok(())
}

/// Any failure exits non-zero.
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}

async fn execute(command: &Command, config: TomlConfig) -> Result<(), EtlError> {
    let discoverer = CatalogDiscoverer::from_config(&config)?;

    match command {
        Command::Years => {
            for entry in discoverer.discover().await? {
                println!("{}\t{}", entry.label, entry.source_url);
            }
        }
        Command::Values { year, campo } => {
            let entry = discoverer.find(*year).await?;
            let storage = LocalStorage::new(config.output_path().to_string());
            let pipeline = ProductionPipeline::new(storage, config, entry, FilterCriteria::new())?;

            let table = EtlEngine::new(pipeline).prepare().await?;
            let options = filter_options(&table, campo.as_deref());

            let values = if campo.is_some() {
                options.pocos
            } else {
                options.campos
            };
            for value in values {
                println!("{}", value);
            }
        }
        Command::Export {
            year, campo, poco, ..
        } => {
            let entry = discoverer.find(*year).await?;
            let criteria = FilterCriteria {
                campo: campo.clone(),
                poco: poco.clone(),
            };

            let storage = LocalStorage::new(config.output_path().to_string());
            let pipeline = ProductionPipeline::new(storage, config, entry, criteria)?;
            let output_path = EtlEngine::new(pipeline).run().await?;

            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
    }

    Ok(())
}
