//! Security list and NSG rule report.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use super::client::OciClient;
use super::types::{Compartment, NsgRule, SecurityList, display_or_na};
use crate::checks;
use crate::output;
use crate::report::{self, Cell, NA, Table, ToRow};

pub const REPORT_FILE: &str = "security_nsg_report.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleSource {
    #[default]
    SecurityList,
    Nsg,
}

/// One firewall rule with its exposure remark.
#[derive(Debug, Clone, Default)]
pub struct RuleRow {
    pub compartment: String,
    pub source: RuleSource,
    pub name: String,
    pub direction: String,
    pub protocol: Option<String>,
    pub endpoint: Option<String>,
    pub options: String,
}

impl ToRow for RuleRow {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Type",
        "Name",
        "Rule Type",
        "Protocol",
        "Source/Destination",
        "Options",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        let kind = match self.source {
            RuleSource::SecurityList => "Security List",
            RuleSource::Nsg => "NSG",
        };
        vec![
            Cell::from(&self.compartment),
            Cell::from(kind),
            Cell::from(&self.name),
            Cell::from(&self.direction),
            Cell::opt(self.protocol.clone()),
            Cell::opt(self.endpoint.clone()),
            Cell::from(&self.options),
            Cell::from(checks::rule_remark(self.endpoint.as_deref())),
        ]
    }
}

/// Port options as compact JSON, or `"N/A"` when the rule has none.
fn options_text(tcp: Option<&Value>, udp: Option<&Value>) -> String {
    tcp.or(udp)
        .filter(|v| !v.is_null())
        .map(Value::to_string)
        .unwrap_or_else(|| NA.to_string())
}

pub fn security_list_rows(compartment: &str, list: &SecurityList) -> Vec<RuleRow> {
    let name = display_or_na(list.display_name.as_deref());

    let ingress = list.ingress_security_rules.iter().map(|rule| RuleRow {
        compartment: compartment.to_string(),
        source: RuleSource::SecurityList,
        name: name.clone(),
        direction: "Ingress".to_string(),
        protocol: rule.protocol.clone(),
        endpoint: rule.source.clone(),
        options: options_text(rule.tcp_options.as_ref(), rule.udp_options.as_ref()),
    });
    let egress = list.egress_security_rules.iter().map(|rule| RuleRow {
        compartment: compartment.to_string(),
        source: RuleSource::SecurityList,
        name: name.clone(),
        direction: "Egress".to_string(),
        protocol: rule.protocol.clone(),
        endpoint: rule.destination.clone(),
        options: options_text(rule.tcp_options.as_ref(), rule.udp_options.as_ref()),
    });

    ingress.chain(egress).collect()
}

pub fn nsg_rows(compartment: &str, nsg_name: &str, rules: &[NsgRule]) -> Vec<RuleRow> {
    rules
        .iter()
        .map(|rule| RuleRow {
            compartment: compartment.to_string(),
            source: RuleSource::Nsg,
            name: nsg_name.to_string(),
            direction: display_or_na(rule.direction.as_deref()),
            protocol: rule.protocol.clone(),
            endpoint: rule.endpoint().map(str::to_string),
            options: options_text(rule.tcp_options.as_ref(), rule.udp_options.as_ref()),
        })
        .collect()
}

pub async fn collect_rules(client: &OciClient) -> Result<Table> {
    let compartments: Vec<Compartment> = client
        .list_compartments()
        .await?
        .into_iter()
        .filter(Compartment::is_active)
        .collect();

    let mut rows = Vec::new();
    let pb = output::compartment_progress(compartments.len());

    for compartment in &compartments {
        pb.set_message(compartment.name.clone());
        info!(compartment = %compartment.name, "Checking compartment");

        for list in client.list_security_lists(&compartment.id).await? {
            rows.extend(security_list_rows(&compartment.name, &list));
        }

        for nsg in client.list_nsgs(&compartment.id).await? {
            let rules = client.list_nsg_rules(&nsg.id).await?;
            let name = display_or_na(nsg.display_name.as_deref());
            rows.extend(nsg_rows(&compartment.name, &name, &rules));
        }

        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(Table::from_records("Security Rules", &rows)?)
}

pub async fn run_security(client: &OciClient, output_dir: &Path) -> Result<PathBuf> {
    output::print_collecting("security lists and NSGs");
    let table = collect_rules(client).await?;

    let risky = table
        .column_text(7)
        .iter()
        .filter(|remark| remark.as_str() == checks::REMARK_RISKY)
        .count();
    output::print_found(table.len(), "rules");
    if risky > 0 {
        output::print_warning(&format!("{} rules are open to 0.0.0.0/0", risky));
    }

    let path = report::output_path(output_dir, REPORT_FILE)?;
    report::csv::save_csv(&table, &path)?;
    output::print_saved(&path);
    Ok(path)
}
