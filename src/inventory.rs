//! Parser for the two-section CSV inventory produced by autocurator.
//!
//! The first section is one row per aggregated time point, the second section
//! (after a `file_ix,filename` marker) lists the physical files by index.

use crate::domain::model::{FileEntry, Inventory, SliceRef, TimeRow};
use crate::utils::error::{Result, ScanError};
use std::io::Read;

/// Marker starting the file section of the inventory.
const FILE_SECTION_MARKER: &str = "file_ix";

pub fn parse_inventory<R: Read>(reader: R) -> Result<Inventory> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut variables: Vec<String> = Vec::new();
    let mut time_rows: Vec<TimeRow> = Vec::new();
    let mut files: Vec<FileEntry> = Vec::new();

    let mut saw_flag_row = false;
    let mut in_file_section = false;

    for record in rdr.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(time_rows.len() + 2);

        if variables.is_empty() {
            variables = record.iter().map(str::to_string).collect();
            if variables.first().map(String::as_str) != Some("time") {
                return Err(ScanError::InventoryError {
                    line,
                    message: "header row must start with a 'time' column".to_string(),
                });
            }
            continue;
        }

        // The second row flags time-dependent variables; this tool rederives
        // that from the representative file instead.
        if !saw_flag_row {
            saw_flag_row = true;
            continue;
        }

        if !in_file_section {
            if record.get(0) == Some(FILE_SECTION_MARKER) {
                in_file_section = true;
                continue;
            }

            let timestamp = record.get(0).unwrap_or_default().to_string();
            if timestamp.is_empty() {
                continue;
            }
            let cells = record.iter().skip(1).map(str::to_string).collect();
            time_rows.push(TimeRow {
                line,
                timestamp,
                cells,
            });
            continue;
        }

        let index: usize = record
            .get(0)
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|_| ScanError::InventoryError {
                line,
                message: format!("invalid file index '{}'", record.get(0).unwrap_or_default()),
            })?;
        if index != files.len() {
            return Err(ScanError::InventoryError {
                line,
                message: format!(
                    "file indices must be dense and ordered, expected {} but found {}",
                    files.len(),
                    index
                ),
            });
        }
        let path = record
            .get(1)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ScanError::InventoryError {
                line,
                message: format!("file entry {} has no filename", index),
            })?;
        files.push(FileEntry {
            index,
            path: path.to_string(),
        });
    }

    if variables.is_empty() {
        return Err(ScanError::InventoryError {
            line: 1,
            message: "inventory is empty".to_string(),
        });
    }
    if !in_file_section {
        return Err(ScanError::InventoryError {
            line: time_rows.last().map(|r| r.line).unwrap_or(1),
            message: "inventory has no file_ix section".to_string(),
        });
    }

    Ok(Inventory {
        variables,
        time_rows,
        files,
    })
}

impl TimeRow {
    /// Parse the `file_ix:time_ix` cell for a header column. Column 0 is the
    /// timestamp itself; an empty or absent cell means the variable has no
    /// slice at this time point.
    pub fn slice_ref(&self, column: usize) -> Result<Option<SliceRef>> {
        if column == 0 {
            return Err(ScanError::InventoryError {
                line: self.line,
                message: "column 0 holds the timestamp, not a slice reference".to_string(),
            });
        }

        let cell = match self.cells.get(column - 1) {
            Some(cell) if !cell.trim().is_empty() => cell.trim(),
            _ => return Ok(None),
        };

        let (file_part, time_part) =
            cell.split_once(':')
                .ok_or_else(|| ScanError::InventoryError {
                    line: self.line,
                    message: format!("malformed slice reference '{}'", cell),
                })?;

        let file_ix = file_part
            .parse()
            .map_err(|_| ScanError::InventoryError {
                line: self.line,
                message: format!("invalid file index in slice reference '{}'", cell),
            })?;
        let time_ix = time_part
            .parse()
            .map_err(|_| ScanError::InventoryError {
                line: self.line,
                message: format!("invalid time index in slice reference '{}'", cell),
            })?;

        Ok(Some(SliceRef { file_ix, time_ix }))
    }
}
