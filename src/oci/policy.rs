//! Tenancy policy export to CSV and xlsx.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use super::client::OciClient;
use super::types::Policy;
use crate::output;
use crate::report::{self, Cell, Table, ToRow};

#[derive(Debug, Clone, Default)]
pub struct PolicyRow {
    pub policy_name: String,
    pub compartment_id: Option<String>,
    pub statement: String,
    pub lifecycle_state: Option<String>,
    pub time_created: Option<String>,
}

impl ToRow for PolicyRow {
    const HEADERS: &'static [&'static str] = &[
        "Policy Name",
        "Compartment ID",
        "Statement",
        "Lifecycle State",
        "Time Created",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.policy_name),
            Cell::opt(self.compartment_id.clone()),
            Cell::from(&self.statement),
            Cell::opt(self.lifecycle_state.clone()),
            Cell::opt(self.time_created.clone()),
        ]
    }
}

pub fn policy_rows(policies: &[Policy]) -> Vec<PolicyRow> {
    policies
        .iter()
        .flat_map(|policy| {
            policy.statements.iter().map(|statement| PolicyRow {
                policy_name: policy.name.clone(),
                compartment_id: policy.compartment_id.clone(),
                statement: statement.clone(),
                lifecycle_state: policy.lifecycle_state.clone(),
                time_created: policy.time_created.clone(),
            })
        })
        .collect()
}

/// `tenancy_policies_<tenancy>_<date>` where `<tenancy>` is the second
/// dot-separated field of the tenancy OCID.
pub fn file_stem(tenancy_id: &str, date: NaiveDate) -> String {
    let tenancy_name = tenancy_id.split('.').nth(1).unwrap_or("unknown");
    format!(
        "tenancy_policies_{}_{}",
        tenancy_name,
        date.format("%Y-%m-%d")
    )
}

/// Write the policy CSV and workbook. Returns no paths when the tenancy has
/// no policy statements.
pub async fn run_policies(
    client: &OciClient,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<Vec<PathBuf>> {
    output::print_collecting("tenancy policies");
    info!(tenancy = client.tenancy_id(), "Fetching policies");

    let policies = client.list_policies(client.tenancy_id()).await?;
    let rows = policy_rows(&policies);
    if rows.is_empty() {
        output::print_warning("No policies found or unable to fetch policies.");
        return Ok(Vec::new());
    }
    output::print_found(rows.len(), "policy statements");

    let table = Table::from_records("Policies", &rows)?;
    let stem = file_stem(client.tenancy_id(), today);

    let csv_path = report::output_path(output_dir, &format!("{}.csv", stem))?;
    report::csv::save_csv(&table, &csv_path)?;
    output::print_saved(&csv_path);

    let xlsx_path = report::output_path(output_dir, &format!("{}.xlsx", stem))?;
    report::xlsx::save_workbook(std::slice::from_ref(&table), &xlsx_path)?;
    output::print_saved(&xlsx_path);

    Ok(vec![csv_path, xlsx_path])
}
