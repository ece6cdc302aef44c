use crate::cdml::{self, TimeAggregate};
use crate::config::options::ScanOptions;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Inventory, ScanOutput};
use crate::inventory;
use crate::mapping;
use crate::metadata;
use crate::timeconv::{self, Calendar, TimeUnits};
use crate::utils::error::{Result, ScanError};
use std::io::Cursor;
use std::path::Path;

/// One-shot pipeline turning an autocurator inventory into a CDML catalog.
pub struct CdmlPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    options: ScanOptions,
}

impl<S: Storage, C: ConfigProvider> CdmlPipeline<S, C> {
    pub fn new(storage: S, config: C, options: ScanOptions) -> Self {
        Self {
            storage,
            config,
            options,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CdmlPipeline<S, C> {
    async fn extract(&self) -> Result<Inventory> {
        tracing::debug!("Reading inventory from: {}", self.config.input_path());
        let raw = self.storage.read_file(self.config.input_path()).await?;
        let inventory = inventory::parse_inventory(Cursor::new(raw))?;

        if inventory.time_rows.is_empty() {
            return Err(ScanError::ProcessingError {
                message: "inventory has no time rows".to_string(),
            });
        }
        if inventory.files.is_empty() {
            return Err(ScanError::ProcessingError {
                message: "inventory lists no files".to_string(),
            });
        }

        Ok(inventory)
    }

    async fn transform(&self, inventory: Inventory) -> Result<ScanOutput> {
        let representative = Path::new(&inventory.files[0].path);
        tracing::debug!(
            "Opening representative file: {}",
            representative.display()
        );
        let meta = metadata::read_dataset(representative)?;

        let time_axis = meta.time_axis().ok_or_else(|| ScanError::ProcessingError {
            message: format!("no time axis found in {}", representative.display()),
        })?;
        let reference = meta
            .variables
            .iter()
            .find(|var| var.is_time_dependent)
            .ok_or_else(|| ScanError::ProcessingError {
                message: format!(
                    "no time-dependent variable found in {}",
                    representative.display()
                ),
            })?;

        let column = inventory.column_of(&reference.id).ok_or_else(|| {
            ScanError::ProcessingError {
                message: format!(
                    "variable '{}' is missing from the inventory header",
                    reference.id
                ),
            }
        })?;
        tracing::debug!("Using '{}' as the reference variable", reference.id);

        // Run-length-encode the reference variable's file locations.
        let mut locations = Vec::with_capacity(inventory.time_rows.len());
        for row in &inventory.time_rows {
            let slice = row
                .slice_ref(column)?
                .ok_or_else(|| ScanError::InventoryError {
                    line: row.line,
                    message: format!("missing slice reference for '{}'", reference.id),
                })?;
            locations.push(slice.file_ix);
        }
        let spans = mapping::partition_spans(&locations);
        for span in &spans {
            if span.location >= inventory.files.len() {
                return Err(ScanError::ProcessingError {
                    message: format!(
                        "time rows reference file {} but the inventory lists only {} files",
                        span.location,
                        inventory.files.len()
                    ),
                });
            }
        }

        // Convert the absolute inventory timestamps onto the file's time axis.
        let units = time_axis
            .units
            .as_deref()
            .ok_or_else(|| ScanError::ProcessingError {
                message: format!("time axis '{}' has no units attribute", time_axis.id),
            })?;
        let units = TimeUnits::parse(units)?;
        let calendar_name = self
            .options
            .calendar
            .clone()
            .or_else(|| time_axis.calendar.clone())
            .unwrap_or_else(|| "gregorian".to_string());
        let calendar = Calendar::parse(&calendar_name)?;

        let mut time_values = Vec::with_capacity(inventory.time_rows.len());
        for row in &inventory.time_rows {
            time_values.push(timeconv::to_relative(&row.timestamp, &units, calendar)?);
        }

        let time_vars: Vec<&str> = meta
            .variables
            .iter()
            .filter(|var| var.is_time_dependent)
            .map(|var| var.id.as_str())
            .collect();
        let nontime_vars: Vec<&str> = meta
            .variables
            .iter()
            .filter(|var| !var.is_time_dependent)
            .map(|var| var.id.as_str())
            .collect();

        let filemap = mapping::render_filemap(&time_vars, &nontime_vars, &spans, &inventory.files)?;
        let directory = Path::new(&inventory.files[spans[0].location].path)
            .parent()
            .and_then(|dir| dir.to_str())
            .unwrap_or("")
            .to_string();

        let time = TimeAggregate {
            id: time_axis.id.clone(),
            calendar: calendar_name,
            partition: mapping::time_partition(&spans),
            values: time_values,
        };

        let variables = meta.variables.len();
        let dataset = cdml::build_dataset(&meta, &time, &filemap, &directory, &self.options);
        let document = dataset.render()?;

        Ok(ScanOutput {
            document,
            dataset_id: self.options.dataset_id().to_string(),
            time_values: time.values.len(),
            files: inventory.files.len(),
            variables,
        })
    }

    async fn load(&self, output: ScanOutput) -> Result<String> {
        let body = format!(
            "{}\n{}\n{}\n",
            cdml::XML_DECLARATION,
            cdml::CDML_DOCTYPE,
            output.document
        );
        self.storage
            .write_file(self.config.output_path(), body.as_bytes())
            .await?;
        Ok(self.config.output_path().to_string())
    }
}
