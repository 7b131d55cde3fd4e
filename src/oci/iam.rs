//! IAM users, group membership and policy statements.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use super::client::OciClient;
use super::types::{Policy, User, format_time};
use crate::checks;
use crate::output;
use crate::report::{self, Cell, Table, ToRow};

pub const REPORT_FILE: &str = "iam_audit_report.xlsx";

#[derive(Debug, Clone, Default)]
pub struct IamUserRow {
    pub name: String,
    pub id: String,
    pub state: String,
    pub groups: Vec<String>,
    pub last_login: Option<String>,
}

impl ToRow for IamUserRow {
    const HEADERS: &'static [&'static str] = &[
        "User Name",
        "User OCID",
        "Status",
        "Groups",
        "Last Login",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        let groups = if self.groups.is_empty() {
            "No Group".to_string()
        } else {
            self.groups.join(", ")
        };
        vec![
            Cell::from(&self.name),
            Cell::from(&self.id),
            Cell::from(&self.state),
            Cell::from(groups),
            Cell::opt(self.last_login.clone()),
            Cell::from(checks::iam_user_remark(&self.state)),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyStatementRow {
    pub policy_name: String,
    pub statement: String,
    pub compartment_id: Option<String>,
}

impl ToRow for PolicyStatementRow {
    const HEADERS: &'static [&'static str] = &["Policy Name", "Statements", "Compartment ID"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.policy_name),
            Cell::from(&self.statement),
            Cell::opt(self.compartment_id.clone()),
        ]
    }
}

/// Map user OCID to the names of the groups it belongs to.
pub type Memberships = HashMap<String, Vec<String>>;

pub fn user_rows(users: Vec<User>, memberships: &Memberships) -> Vec<IamUserRow> {
    users
        .into_iter()
        .map(|user| IamUserRow {
            groups: memberships.get(&user.id).cloned().unwrap_or_default(),
            last_login: user
                .last_successful_login_time
                .as_deref()
                .map(|t| format_time(Some(t))),
            state: user.lifecycle_state.unwrap_or_default(),
            name: user.name,
            id: user.id,
        })
        .collect()
}

/// One row per policy statement.
pub fn statement_rows(policies: &[Policy]) -> Vec<PolicyStatementRow> {
    policies
        .iter()
        .flat_map(|policy| {
            policy.statements.iter().map(|statement| PolicyStatementRow {
                policy_name: policy.name.clone(),
                statement: statement.clone(),
                compartment_id: policy.compartment_id.clone(),
            })
        })
        .collect()
}

/// Build both IAM sheets from the tenancy's users, groups and policies.
pub async fn collect_iam(client: &OciClient) -> Result<Vec<Table>> {
    output::print_collecting("IAM users");
    let users = client.list_users().await?;
    output::print_found(users.len(), "users");

    let groups = client.list_groups().await?;
    let mut memberships = Memberships::new();
    for group in &groups {
        for member in client.list_group_members(&group.id).await? {
            memberships
                .entry(member.id)
                .or_default()
                .push(group.name.clone());
        }
    }
    info!(groups = groups.len(), "Resolved group memberships");

    output::print_collecting("IAM policies");
    let policies = client.list_policies(client.tenancy_id()).await?;
    output::print_found(policies.len(), "policies");

    Ok(vec![
        Table::from_records("IAM Users", &user_rows(users, &memberships))?,
        Table::from_records("IAM Policies", &statement_rows(&policies))?,
    ])
}

pub async fn run_iam(client: &OciClient, output_dir: &Path) -> Result<PathBuf> {
    let tables = collect_iam(client).await?;

    let path = report::output_path(output_dir, REPORT_FILE)?;
    report::xlsx::save_workbook(&tables, &path)?;

    output::print_summary(&tables);
    output::print_saved(&path);
    Ok(path)
}
