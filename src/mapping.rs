//! Run-length encoding of per-time-point file locations into contiguous
//! spans, plus rendering of the `cdms_filemap` and `partition` strings.

use crate::domain::model::{FileEntry, FileSpan};
use crate::utils::error::{Result, ScanError};
use std::path::Path;

/// Collapse consecutive equal locations into `[start, end)` spans.
pub fn partition_spans(locations: &[usize]) -> Vec<FileSpan> {
    let mut spans: Vec<FileSpan> = Vec::new();
    for (index, &location) in locations.iter().enumerate() {
        match spans.last_mut() {
            Some(span) if span.location == location => span.end = index + 1,
            _ => spans.push(FileSpan {
                location,
                start: index,
                end: index + 1,
            }),
        }
    }
    spans
}

/// Flattened `[start_0 end_0 start_1 end_1 ...]` list for the time axis
/// `partition` attribute.
pub fn time_partition(spans: &[FileSpan]) -> Vec<usize> {
    spans.iter().flat_map(|s| [s.start, s.end]).collect()
}

pub fn render_partition(partition: &[usize]) -> String {
    let joined = partition
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{}]", joined)
}

/// Render the `cdms_filemap` attribute: time-dependent variables map to the
/// span list, everything else to the first mapped file.
pub fn render_filemap(
    time_vars: &[&str],
    nontime_vars: &[&str],
    spans: &[FileSpan],
    files: &[FileEntry],
) -> Result<String> {
    let first = spans.first().ok_or_else(|| ScanError::ProcessingError {
        message: "cannot build a file map without any time spans".to_string(),
    })?;

    let span_list = spans
        .iter()
        .map(|span| {
            Ok(format!(
                "[{},{},-,-,-,{}]",
                span.start,
                span.end,
                basename(files, span.location)?
            ))
        })
        .collect::<Result<Vec<_>>>()?
        .join(",");

    Ok(format!(
        "[[[{}],[{}]],[[{}],[[-,-,-,-,-,{}]]]]",
        time_vars.join(","),
        span_list,
        nontime_vars.join(","),
        basename(files, first.location)?
    ))
}

fn basename(files: &[FileEntry], location: usize) -> Result<&str> {
    let entry = files.get(location).ok_or_else(|| ScanError::ProcessingError {
        message: format!("file location {} is not listed in the inventory", location),
    })?;
    Ok(Path::new(&entry.path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(entry.path.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(index: usize, path: &str) -> FileEntry {
        FileEntry {
            index,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_partition_spans() {
        let spans = partition_spans(&[0, 0, 0, 1, 1, 2]);
        assert_eq!(
            spans,
            vec![
                FileSpan {
                    location: 0,
                    start: 0,
                    end: 3
                },
                FileSpan {
                    location: 1,
                    start: 3,
                    end: 5
                },
                FileSpan {
                    location: 2,
                    start: 5,
                    end: 6
                },
            ]
        );
    }

    #[test]
    fn test_partition_spans_single_run() {
        let spans = partition_spans(&[4, 4]);
        assert_eq!(
            spans,
            vec![FileSpan {
                location: 4,
                start: 0,
                end: 2
            }]
        );
        assert!(partition_spans(&[]).is_empty());
    }

    #[test]
    fn test_time_partition() {
        let spans = partition_spans(&[0, 0, 1, 1]);
        assert_eq!(time_partition(&spans), vec![0, 2, 2, 4]);
        assert_eq!(render_partition(&time_partition(&spans)), "[0 2 2 4]");
    }

    #[test]
    fn test_render_filemap() {
        let files = vec![
            file(0, "/data/tas_1979.nc"),
            file(1, "/data/tas_1980.nc"),
        ];
        let spans = partition_spans(&[0, 0, 1, 1]);
        let map = render_filemap(
            &["tas", "bounds_time"],
            &["weights_lat"],
            &spans,
            &files,
        )
        .unwrap();
        assert_eq!(
            map,
            "[[[tas,bounds_time],[[0,2,-,-,-,tas_1979.nc],[2,4,-,-,-,tas_1980.nc]]],\
             [[weights_lat],[[-,-,-,-,-,tas_1979.nc]]]]"
        );
    }

    #[test]
    fn test_render_filemap_unknown_location() {
        let files = vec![file(0, "/data/tas_1979.nc")];
        let spans = partition_spans(&[0, 1]);
        assert!(render_filemap(&["tas"], &[], &spans, &files).is_err());
    }

    #[test]
    fn test_render_filemap_needs_spans() {
        assert!(render_filemap(&["tas"], &[], &[], &[]).is_err());
    }
}
