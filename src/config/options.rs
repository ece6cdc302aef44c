use crate::timeconv::Calendar;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATASET_ID: &str = "none";

/// Global attributes promoted onto the `<dataset>` element itself, the way
/// cdscan treats them.
pub const DEFAULT_PROMOTED_ATTRIBUTES: [&str; 5] =
    ["institution", "production", "calendar", "Conventions", "history"];

/// Optional scan options loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    pub id: Option<String>,
    pub promoted_attributes: Option<Vec<String>>,
    pub calendar: Option<String>,
}

impl ScanOptions {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let options: ScanOptions = toml::from_str(&raw)?;
        options.validate()?;
        Ok(options)
    }

    pub fn dataset_id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_DATASET_ID)
    }

    pub fn promoted_attributes(&self) -> Vec<String> {
        self.promoted_attributes.clone().unwrap_or_else(|| {
            DEFAULT_PROMOTED_ATTRIBUTES
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
    }
}

impl Validate for ScanOptions {
    fn validate(&self) -> Result<()> {
        if let Some(id) = &self.id {
            validation::validate_non_empty_string("id", id)?;
        }
        if let Some(names) = &self.promoted_attributes {
            for name in names {
                validation::validate_non_empty_string("promoted_attributes", name)?;
            }
        }
        if let Some(calendar) = &self.calendar {
            Calendar::parse(calendar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.dataset_id(), "none");
        assert_eq!(options.promoted_attributes().len(), 5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let options: ScanOptions = toml::from_str(
            r#"
id = "tas_ccsr"
promoted_attributes = ["institution", "history"]
calendar = "noleap"
"#,
        )
        .unwrap();
        assert_eq!(options.dataset_id(), "tas_ccsr");
        assert_eq!(options.promoted_attributes(), vec!["institution", "history"]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_calendar() {
        let options = ScanOptions {
            calendar: Some("julian".to_string()),
            ..ScanOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_id() {
        let options = ScanOptions {
            id: Some("  ".to_string()),
            ..ScanOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
