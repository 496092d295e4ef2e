//! Batch input: phone numbers from the first column of a CSV file, grouped
//! into fixed-size batches (the last one may be shorter).

use crate::error::InputError;
use std::path::Path;

fn looks_like_phone(cell: &str) -> bool {
    let digits: String = cell.chars().filter(|c| !c.is_whitespace() && *c != '+').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Reads phone numbers into batches of `batch_size`. The first row is
/// treated as a header and skipped unless it already looks like a phone
/// number.
pub fn read_phone_batches(path: &Path, batch_size: usize) -> Result<Vec<Vec<String>>, InputError> {
    let batch_size = batch_size.max(1);
    if !path.exists() {
        return Err(InputError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| InputError::Read {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;

    let mut batches: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InputError::Read {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        let Some(cell) = record.get(0).map(str::trim) else {
            continue;
        };
        if cell.is_empty() {
            continue;
        }
        if row_index == 0 && !looks_like_phone(cell) {
            continue;
        }
        current.push(cell.to_string());
        if current.len() >= batch_size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    Ok(batches)
}

/// Slices `[start, end)` out of the batch list, for resuming a partial run.
/// Out-of-range bounds clamp rather than panic.
pub fn select_range(
    batches: Vec<Vec<String>>,
    start: usize,
    end: Option<usize>,
) -> Vec<Vec<String>> {
    let len = batches.len();
    let start = start.min(len);
    let end = end.unwrap_or(len).min(len).max(start);
    batches[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn input_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn header_row_is_skipped() {
        let file = input_file("phone_number\n+15550001\n+15550002\n+15550003\n");
        let batches = read_phone_batches(file.path(), 2).unwrap();
        assert_eq!(
            batches,
            vec![
                vec!["+15550001".to_string(), "+15550002".to_string()],
                vec!["+15550003".to_string()],
            ]
        );
    }

    #[test]
    fn headerless_file_keeps_the_first_row() {
        let file = input_file("+15550001\n+15550002\n");
        let batches = read_phone_batches(file.path(), 10).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[test]
    fn blank_rows_are_dropped() {
        let file = input_file("+15550001\n\n+15550002\n");
        let batches = read_phone_batches(file.path(), 10).unwrap();
        assert_eq!(batches[0], vec!["+15550001", "+15550002"]);
    }

    #[test]
    fn missing_file_is_a_fatal_input_error() {
        let err = read_phone_batches(Path::new("definitely/not/here.csv"), 10).unwrap_err();
        assert!(matches!(err, InputError::FileNotFound { .. }));
    }

    #[test]
    fn range_selection_clamps() {
        let batches = vec![
            vec!["a".to_string()],
            vec!["b".to_string()],
            vec!["c".to_string()],
        ];
        assert_eq!(select_range(batches.clone(), 1, Some(2)).len(), 1);
        assert_eq!(select_range(batches.clone(), 0, None).len(), 3);
        assert_eq!(select_range(batches.clone(), 5, None).len(), 0);
        assert_eq!(select_range(batches, 1, Some(99)).len(), 2);
    }
}
