//! OCI config file lookup.
//!
//! The config file is INI-style. Keys in `[DEFAULT]` apply to every
//! profile unless the profile overrides them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::InventoryError;

pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Tenancy and region of one config profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub tenancy: String,
    pub region: Option<String>,
}

impl OciProfile {
    /// `~/.oci/config`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".oci").join("config"))
    }

    pub fn load(path: &Path, profile: &str) -> Result<Self, InventoryError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::OciConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents, profile)
    }

    pub fn parse(contents: &str, profile: &str) -> Result<Self, InventoryError> {
        let sections = parse_sections(contents);

        if profile != DEFAULT_PROFILE && !sections.contains_key(profile) {
            return Err(InventoryError::OciConfig(format!(
                "profile '{}' not found",
                profile
            )));
        }

        let lookup = |key: &str| -> Option<String> {
            sections
                .get(profile)
                .and_then(|s| s.get(key))
                .or_else(|| sections.get(DEFAULT_PROFILE).and_then(|s| s.get(key)))
                .cloned()
        };

        let tenancy = lookup("tenancy").ok_or_else(|| {
            InventoryError::OciConfig(format!("no tenancy set for profile '{}'", profile))
        })?;

        Ok(Self {
            tenancy,
            region: lookup("region"),
        })
    }
}

fn parse_sections(contents: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    sections
}
