//! Report tables and file exporters.

pub mod csv;
pub mod json;
pub mod table;
pub mod xlsx;

pub use table::{Cell, ChartKind, ChartSpec, NA, Table, ToRow};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve `file_name` inside `dir`, creating the directory if needed.
pub fn output_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    Ok(dir.join(file_name))
}

/// Create the parent directory of `path` if it is missing.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    Ok(())
}
