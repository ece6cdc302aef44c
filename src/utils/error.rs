use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("NetCDF error: {0}")]
    NetCdfError(#[from] netcdf::Error),

    #[error("Options file error: {0}")]
    OptionsError(#[from] toml::de::Error),

    #[error("Inventory error at line {line}: {message}")]
    InventoryError { line: usize, message: String },

    #[error("Time conversion error for '{value}': {reason}")]
    TimeError { value: String, reason: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Data,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::IoError(_) => ErrorCategory::Io,
            ScanError::CsvError(_) | ScanError::InventoryError { .. } => ErrorCategory::Input,
            ScanError::NetCdfError(_)
            | ScanError::TimeError { .. }
            | ScanError::ProcessingError { .. } => ErrorCategory::Data,
            ScanError::OptionsError(_)
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorCategory::Config,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Config => ErrorSeverity::Medium,
            ErrorCategory::Io | ErrorCategory::Data => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScanError::IoError(_) => {
                "Check that the input file exists and the output location is writable"
            }
            ScanError::CsvError(_) | ScanError::InventoryError { .. } => {
                "Verify the CSV was produced by autocurator and has both the time and file_ix sections"
            }
            ScanError::NetCdfError(_) => {
                "Make sure the first file listed in the inventory is a readable NetCDF file"
            }
            ScanError::TimeError { .. } => {
                "Check the time axis units and calendar attributes of the representative file"
            }
            ScanError::OptionsError(_)
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => {
                "Review the command line arguments and options file"
            }
            ScanError::ProcessingError { .. } => {
                "Inspect the inventory and the representative NetCDF file for inconsistencies"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::IoError(e) => format!("File access failed: {}", e),
            ScanError::CsvError(e) => format!("Could not read the inventory CSV: {}", e),
            ScanError::NetCdfError(e) => {
                format!("Could not read the representative NetCDF file: {}", e)
            }
            ScanError::OptionsError(e) => format!("Could not parse the options file: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
