//! VCN listing across compartments.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::client::OciClient;
use crate::output;
use crate::report::{self, NA};

pub const REPORT_FILE: &str = "vcn_details.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VcnDetail {
    pub compartment: String,
    pub vcn_name: String,
    pub vcn_id: String,
    pub region: String,
}

pub async fn collect_vcns(client: &OciClient) -> Result<Vec<VcnDetail>> {
    let region = client.region().unwrap_or(NA).to_string();
    let mut details = Vec::new();

    for compartment in client.list_active_compartments_with_root().await? {
        info!(compartment = %compartment.name, "Listing VCNs");
        for vcn in client.list_vcns(&compartment.id).await? {
            details.push(VcnDetail {
                compartment: compartment.name.clone(),
                vcn_name: vcn.display_name.unwrap_or_else(|| NA.to_string()),
                vcn_id: vcn.id,
                region: region.clone(),
            });
        }
    }
    Ok(details)
}

pub async fn run_vcns(client: &OciClient, output_dir: &Path) -> Result<PathBuf> {
    output::print_collecting("VCNs");
    let details = collect_vcns(client).await?;
    output::print_found(details.len(), "VCNs");

    let path = report::output_path(output_dir, REPORT_FILE)?;
    report::json::save_json(&details, &path)?;
    output::print_saved(&path);
    Ok(path)
}
