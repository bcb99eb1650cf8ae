use crate::errors::{Result, TargetError};
use csv::{ReaderBuilder, WriterBuilder};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_csv::{Array2Reader, Array2Writer};
use std::path::Path;

/// Reads a numeric table (one row per line) from a text file.
///
/// Values may be separated by commas and/or whitespaces, empty lines and lines
/// starting with `#` are ignored. All rows must have the same number of values.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let content = std::fs::read_to_string(path)?;
    parse_table(&content)
}

/// Parses a numeric table, see [read_table]
pub fn parse_table(content: &str) -> Result<Array2<f64>> {
    let normalized = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");
    if normalized.is_empty() {
        return Err(TargetError::InvalidValue("empty table".to_string()));
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(normalized.as_bytes());
    let table: Array2<f64> = reader.deserialize_array2_dynamic()?;
    Ok(table)
}

/// Writes a numeric table as a space delimited text file without header
pub fn write_table<P: AsRef<Path>>(
    path: P,
    table: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .from_path(path)?;
    writer.serialize_array2(&table.to_owned())?;
    writer.flush()?;
    Ok(())
}
