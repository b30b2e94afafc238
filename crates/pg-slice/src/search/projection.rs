//! Parsed projection CSVs.
//!
//! After a table's raw CSV is on disk, the rows are re-read and only the
//! needed-FK columns are kept, with a header row naming them. Later tables
//! read these projections as their `IN (…)` seed sets, so the projection is
//! the only cross-table dataflow in the run.

use super::DELIMITER_CHAR;
use crate::error::{Result, SliceError};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A needed column and its index within the raw CSV rows.
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub name: String,
    pub index: usize,
}

/// Re-read `raw_path` and write the projection to `parsed_path`.
///
/// Returns the number of data rows written (the parsed file has one more
/// line: the header).
pub fn write_projection(raw_path: &Path, parsed_path: &Path, cols: &[RawColumn]) -> Result<u64> {
    if cols.is_empty() {
        return Ok(0);
    }

    let reader = BufReader::new(File::open(raw_path)?);
    let mut writer = BufWriter::new(File::create(parsed_path)?);

    let header = cols
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(&DELIMITER_CHAR.to_string());
    writeln!(writer, "{}", header)?;

    let mut rows = 0u64;
    for line in reader.lines() {
        let line = line?;
        let cells: Vec<&str> = line.split(DELIMITER_CHAR).collect();
        let mut out = String::new();
        for (i, col) in cols.iter().enumerate() {
            let cell = cells.get(col.index).ok_or_else(|| {
                SliceError::invariant(format!(
                    "raw CSV row has no column at index {} for {}",
                    col.index, col.name
                ))
            })?;
            if i > 0 {
                out.push(DELIMITER_CHAR);
            }
            out.push_str(cell);
        }
        writeln!(writer, "{}", out)?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const D: char = DELIMITER_CHAR;

    fn raw_lines(lines: &[String]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("t.csv"), lines.join("\n") + "\n").unwrap();
        tmp
    }

    #[test]
    fn projects_selected_columns_with_header() {
        let tmp = raw_lines(&[
            format!("1{}alice{}10", D, D),
            format!("2{}bob{}20", D, D),
        ]);
        let raw = tmp.path().join("t.csv");
        let parsed = tmp.path().join("t_parsed.csv");

        let cols = vec![
            RawColumn { name: "id".into(), index: 0 },
            RawColumn { name: "score".into(), index: 2 },
        ];
        let rows = write_projection(&raw, &parsed, &cols).unwrap();
        assert_eq!(rows, 2);

        let content = fs::read_to_string(&parsed).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert_eq!(lines[0], format!("id{}score", D));
        assert_eq!(lines[1], format!("1{}10", D));
        assert_eq!(lines[2], format!("2{}20", D));
    }

    #[test]
    fn preserves_empty_cells() {
        let tmp = raw_lines(&[format!("1{}{}30", D, D)]);
        let raw = tmp.path().join("t.csv");
        let parsed = tmp.path().join("t_parsed.csv");

        let cols = vec![
            RawColumn { name: "name".into(), index: 1 },
            RawColumn { name: "score".into(), index: 2 },
        ];
        write_projection(&raw, &parsed, &cols).unwrap();

        let content = fs::read_to_string(&parsed).unwrap();
        assert_eq!(content.lines().nth(1).unwrap(), format!("{}30", D));
    }

    #[test]
    fn no_columns_writes_nothing() {
        let tmp = raw_lines(&[format!("1{}x", D)]);
        let raw = tmp.path().join("t.csv");
        let parsed = tmp.path().join("t_parsed.csv");

        let rows = write_projection(&raw, &parsed, &[]).unwrap();
        assert_eq!(rows, 0);
        assert!(!parsed.exists());
    }

    #[test]
    fn short_row_is_invariant_violation() {
        let tmp = raw_lines(&["1".to_string()]);
        let raw = tmp.path().join("t.csv");
        let parsed = tmp.path().join("t_parsed.csv");

        let cols = vec![RawColumn { name: "score".into(), index: 2 }];
        let err = write_projection(&raw, &parsed, &cols).unwrap_err();
        assert!(matches!(err, SliceError::Invariant(_)));
    }
}
