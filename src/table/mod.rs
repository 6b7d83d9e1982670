//! Tabular rendering of flat pairs
//!
//! Many flattened entities of one type become one table: a column per
//! distinct rendered path, in first-seen order, and a row per entity.
//! A path missing from an entity leaves its cell empty; every present value
//! is written as non-empty cell text (see [`FlatValue::to_cell_text`]).

pub mod reader;
pub mod writer;

use crate::flat::FlatPath;
use crate::types::{FlatPair, FlatValue};
use anyhow::{Context, Result};
use std::collections::HashMap;

/// How rows are rendered to and read from delimited text
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub delimiter: u8,
    /// Emit (and expect) the column names as the first record
    pub include_header: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            delimiter: b',',
            include_header: true,
        }
    }
}

/// Parse a single-byte delimiter; `\t` and `tab` mean a tab
pub fn parse_delimiter(text: &str) -> std::result::Result<u8, String> {
    match text {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match text.as_bytes() {
            [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => Ok(*byte),
            _ => Err(format!("`{}` is not a single ASCII delimiter", text)),
        },
    }
}

/// Flat pairs of many entities, laid out as columns and rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    /// Cells by column position; rows may be shorter than `columns`
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// An empty table with a fixed column order
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for column in columns {
            table.column_position(column.into());
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_position(&mut self, name: String) -> usize {
        if let Some(&pos) = self.index.get(&name) {
            return pos;
        }
        let pos = self.columns.len();
        self.index.insert(name.clone(), pos);
        self.columns.push(name);
        pos
    }

    /// Append one entity's pairs as a row
    pub fn push_pairs(&mut self, pairs: &[FlatPair]) -> Result<()> {
        let mut row: Vec<Option<String>> = Vec::new();
        for pair in pairs {
            let pos = self.column_position(pair.path.to_string());
            if row.len() <= pos {
                row.resize(pos + 1, None);
            }
            if row[pos].is_some() {
                anyhow::bail!("duplicate path `{}` in one row", pair.path);
            }
            row[pos] = Some(pair.value.to_cell_text());
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a row of raw cell text, one cell per column; empty cells are absent
    pub fn push_cells<I, S>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row: Vec<Option<String>> = cells
            .into_iter()
            .map(|cell| {
                let cell = cell.as_ref();
                (!cell.is_empty()).then(|| cell.to_string())
            })
            .collect();
        if row.len() != self.columns.len() {
            anyhow::bail!(
                "row {} has {} cells but the table has {} columns",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// The cells of one row, padded to the full column count
    pub fn cells(&self, row: usize) -> impl Iterator<Item = &str> {
        let cells = self.rows.get(row).map(Vec::as_slice).unwrap_or_default();
        (0..self.columns.len()).map(move |pos| cells.get(pos).and_then(Option::as_deref).unwrap_or(""))
    }

    /// Parse every row back into flat pairs, in column order
    pub fn rows(&self) -> Result<Vec<Vec<FlatPair>>> {
        let paths = self
            .columns
            .iter()
            .map(|column| FlatPath::parse(column).with_context(|| format!("Invalid column name: {}", column)))
            .collect::<Result<Vec<_>>>()?;

        self.rows
            .iter()
            .enumerate()
            .map(|(n, row)| {
                row.iter()
                    .enumerate()
                    .filter_map(|(pos, cell)| cell.as_deref().map(|text| (pos, text)))
                    .map(|(pos, text)| -> Result<FlatPair> {
                        let path = &paths[pos];
                        let value = FlatValue::from_cell_text(text, path)
                            .with_context(|| format!("Invalid cell in row {}", n + 1))?;
                        Ok(FlatPair::new(path.clone(), value))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarValue;

    fn pair(path: &str, value: FlatValue) -> FlatPair {
        FlatPair::new(FlatPath::parse(path).unwrap(), value)
    }

    #[test]
    fn test_columns_in_first_seen_order() {
        let mut table = Table::new();
        table
            .push_pairs(&[pair("name", FlatValue::str("a")), pair("tags", FlatValue::EmptyList)])
            .unwrap();
        table
            .push_pairs(&[
                pair("name", FlatValue::str("b")),
                pair("tags[0]", FlatValue::str("x")),
                pair("tags[1]", FlatValue::str("y")),
            ])
            .unwrap();

        assert_eq!(table.columns(), &["name", "tags", "tags[0]", "tags[1]"]);
        let first: Vec<&str> = table.cells(0).collect();
        assert_eq!(first, vec!["a", "\\L", "", ""]);
        let second: Vec<&str> = table.cells(1).collect();
        assert_eq!(second, vec!["b", "", "x", "y"]);
    }

    #[test]
    fn test_rows_skip_absent_cells() {
        let mut table = Table::new();
        table
            .push_pairs(&[pair("name", FlatValue::str("")), pair("count", FlatValue::Value(ScalarValue::Int(3)))])
            .unwrap();
        table.push_pairs(&[pair("note", FlatValue::Null)]).unwrap();

        let rows = table.rows().unwrap();
        assert_eq!(
            rows[0],
            vec![pair("name", FlatValue::str("")), pair("count", FlatValue::str("3"))]
        );
        assert_eq!(rows[1], vec![pair("note", FlatValue::Null)]);
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut table = Table::new();
        let err = table
            .push_pairs(&[pair("name", FlatValue::str("a")), pair("name", FlatValue::str("b"))])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate path"));
    }

    #[test]
    fn test_push_cells_checks_width() {
        let mut table = Table::with_columns(["a", "b"]);
        table.push_cells(["1", ""]).unwrap();
        assert!(table.push_cells(["1"]).is_err());
        assert_eq!(table.rows().unwrap()[0], vec![pair("a", FlatValue::str("1"))]);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("\"").is_err());
    }

    #[test]
    fn test_bad_column_name() {
        let mut table = Table::with_columns(["tags[x]"]);
        table.push_cells(["1"]).unwrap();
        let err = table.rows().unwrap_err();
        assert!(err.to_string().contains("Invalid column name"));
    }
}
