use super::{Table, TableConfig};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

impl Table {
    /// Write the table as delimited text, padding short rows with empty cells
    pub fn write_csv<W: Write>(&self, writer: W, config: &TableConfig) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(config.delimiter)
            .has_headers(false)
            .from_writer(writer);

        if config.include_header && !self.columns().is_empty() {
            csv_writer
                .write_record(self.columns())
                .context("Failed to write header")?;
        }

        for row in 0..self.len() {
            // a row with no columns at all cannot be told apart from a blank line
            if self.columns().is_empty() {
                anyhow::bail!("cannot write row {} of a table with no columns", row + 1);
            }
            csv_writer
                .write_record(self.cells(row))
                .with_context(|| format!("Failed to write row {}", row + 1))?;
        }

        csv_writer.flush().context("Failed to flush writer")?;
        debug!(rows = self.len(), columns = self.columns().len(), "wrote table");
        Ok(())
    }

    /// Render to an in-memory string
    pub fn to_csv_string(&self, config: &TableConfig) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer, config)?;
        String::from_utf8(buffer).context("Table text is not UTF-8")
    }
}
