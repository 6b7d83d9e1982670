use super::{Table, TableConfig};
use anyhow::{Context, Result};
use std::io::Read;
use tracing::{debug, warn};

impl Table {
    /// Read a table whose first record names the columns
    pub fn read_csv<R: Read>(reader: R, config: &TableConfig) -> Result<Table> {
        if !config.include_header {
            anyhow::bail!("reading a table without a header row needs known columns, see Table::extend_from_csv");
        }
        let mut table = Table::new();
        table.extend_from_csv(reader, config)?;
        Ok(table)
    }

    /// Append the records of `reader` to this table.
    ///
    /// With a header row the header must match the current columns, or set
    /// them if the table has none yet. Returns the number of rows read.
    pub fn extend_from_csv<R: Read>(&mut self, reader: R, config: &TableConfig) -> Result<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(config.delimiter)
            .has_headers(config.include_header)
            .flexible(false)
            .from_reader(reader);

        if config.include_header {
            let headers = csv_reader.headers().context("Failed to read CSV headers")?;
            // strip a UTF-8 BOM left by spreadsheet exports
            let names: Vec<String> = headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let name = if i == 0 { h.trim_start_matches('\u{FEFF}') } else { h };
                    name.to_string()
                })
                .collect();

            if self.columns().is_empty() {
                *self = Table::with_columns(names);
            } else if names != self.columns() {
                anyhow::bail!("CSV header does not match the table columns");
            }
        } else if self.columns().is_empty() {
            warn!("reading headerless CSV into a table with no columns");
        }

        let mut count = 0;
        for (n, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", n + 1))?;
            self.push_cells(record.iter())?;
            count += 1;
        }

        debug!(rows = count, columns = self.columns().len(), "read table");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat::FlatPath;
    use crate::types::{FlatPair, FlatValue};

    #[test]
    fn test_read_back_written_table() {
        let mut table = Table::new();
        table
            .push_pairs(&[
                FlatPair::new(FlatPath::field("name"), FlatValue::str("line\nbreak")),
                FlatPair::new(FlatPath::parse("tags[0]").unwrap(), FlatValue::str("\\x")),
            ])
            .unwrap();
        table
            .push_pairs(&[FlatPair::new(FlatPath::field("tags"), FlatValue::EmptyList)])
            .unwrap();

        let config = TableConfig::default();
        let text = table.to_csv_string(&config).unwrap();
        let back = Table::read_csv(text.as_bytes(), &config).unwrap();
        assert_eq!(back.rows().unwrap(), table.rows().unwrap());
        assert_eq!(back.columns(), &["name", "tags[0]", "tags"]);
    }

    #[test]
    fn test_header_with_bom() {
        let text = "\u{FEFF}name,age\nann,3\n";
        let table = Table::read_csv(text.as_bytes(), &TableConfig::default()).unwrap();
        assert_eq!(table.columns(), &["name", "age"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_headerless_needs_columns() {
        let config = TableConfig {
            delimiter: b';',
            include_header: false,
        };
        assert!(Table::read_csv("a;b\n".as_bytes(), &config).is_err());

        let mut table = Table::with_columns(["x", "y"]);
        let count = table.extend_from_csv("1;\n2;3\n".as_bytes(), &config).unwrap();
        assert_eq!(count, 2);
        assert_eq!(table.cells(0).collect::<Vec<_>>(), vec!["1", ""]);
    }

    #[test]
    fn test_ragged_record_rejected() {
        let text = "a,b\n1,2,3\n";
        let err = Table::read_csv(text.as_bytes(), &TableConfig::default()).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_mismatched_header_rejected() {
        let mut table = Table::with_columns(["a"]);
        let err = table
            .extend_from_csv("b\n1\n".as_bytes(), &TableConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
