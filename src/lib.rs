pub mod cdml;
pub mod config;
pub mod core;
pub mod domain;
pub mod inventory;
pub mod mapping;
pub mod metadata;
pub mod timeconv;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::cli::LocalStorage;
pub use crate::config::options::ScanOptions;

pub use crate::core::{engine::ScanEngine, pipeline::CdmlPipeline};
pub use crate::utils::error::{Result, ScanError};
