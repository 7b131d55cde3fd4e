//! CSV export.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::table::Table;

/// Write a table as CSV: header row, then one record per row.
pub fn save_csv(table: &Table, path: &Path) -> Result<PathBuf> {
    super::ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    write_table(&mut writer, table)?;
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_table<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &Table) -> Result<()> {
    writer.write_record(&table.headers)?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    Ok(())
}
