//! JSON export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Write `value` as pretty-printed JSON with four-space indentation.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<PathBuf> {
    super::ensure_parent(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_json(value, &mut writer)?;
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_uses_four_space_indent() {
        let mut buf = Vec::new();
        write_json(&json!({"vcn_name": "prod"}), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\n    \"vcn_name\": \"prod\"\n}"
        );
    }
}
