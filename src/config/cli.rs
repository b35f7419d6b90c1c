use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "anp-etl")]
#[command(about = "Download ANP oil & gas production data and export it as a spreadsheet")]
pub struct CliConfig {
    /// Path to a TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override source.listing_url
    #[arg(long)]
    pub listing_url: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the years available on the portal
    Years,

    /// List Campo values, or the Poço values of one Campo
    Values {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        campo: Option<String>,
    },

    /// Download, clean, filter and write the spreadsheet
    Export {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        campo: Option<String>,

        #[arg(long)]
        poco: Option<String>,

        /// Override load.output_path
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl CliConfig {
    /// File (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(url) = &self.listing_url {
            config.source.listing_url = url.clone();
        }
        if let Command::Export {
            output: Some(output),
            ..
        } = &self.command
        {
            config.load.output_path = output.clone();
        }

        Ok(config)
    }
}
