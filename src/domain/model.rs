use serde::{Deserialize, Serialize};

/// Reference to one time slice inside a physical file, written `file_ix:time_ix`
/// in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRef {
    pub file_ix: usize,
    pub time_ix: usize,
}

/// One aggregated time point: the absolute timestamp plus the raw data cells,
/// one per inventoried variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRow {
    pub line: usize,
    pub timestamp: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub index: usize,
    pub path: String,
}

/// Parsed autocurator inventory: the header variables, the time section and
/// the file_ix section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub variables: Vec<String>,
    pub time_rows: Vec<TimeRow>,
    pub files: Vec<FileEntry>,
}

impl Inventory {
    /// Header column of a variable, counting the leading "time" column.
    pub fn column_of(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }
}

/// A contiguous run of time indices stored in one physical file.
/// `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSpan {
    pub location: usize,
    pub start: usize,
    pub end: usize,
}

/// Result of the transform phase: the serialized dataset element plus summary
/// counts for reporting.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub document: String,
    pub dataset_id: String,
    pub time_values: usize,
    pub files: usize,
    pub variables: usize,
}
