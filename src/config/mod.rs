pub mod cli;
pub mod options;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::{Result, ScanError};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "autocuratorscan")]
#[command(about = "Convert an autocurator CSV inventory into a CDML dataset catalog")]
pub struct CliConfig {
    /// Input CSV file produced by autocurator
    #[arg(short = 'i', long)]
    pub input: String,

    /// Name of the output XML file
    #[arg(short = 'o', long)]
    pub output: String,

    /// Optional TOML file with scan options
    #[arg(long)]
    pub options: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system resource monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_path("output", &self.output)?;
        validation::validate_file_extensions(
            "input",
            std::slice::from_ref(&self.input),
            &["csv"],
        )?;

        if !std::path::Path::new(&self.input).exists() {
            return Err(ScanError::InvalidConfigValueError {
                field: "input".to_string(),
                value: self.input.clone(),
                reason: "file does not exist".to_string(),
            });
        }

        if let Some(options) = &self.options {
            validation::validate_path("options", options)?;
            if !std::path::Path::new(options).exists() {
                return Err(ScanError::InvalidConfigValueError {
                    field: "options".to_string(),
                    value: options.clone(),
                    reason: "file does not exist".to_string(),
                });
            }
        }

        Ok(())
    }
}
