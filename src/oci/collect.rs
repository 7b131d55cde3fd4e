//! Raw JSON dumps of network resources per region and compartment.
//!
//! Files keep the CLI's JSON untouched. A failing command is logged and
//! skipped; the collector moves on to the next compartment or region.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::Value;
use tracing::{info, warn};

use super::client::OciClient;
use super::types::Compartment;
use crate::error::InventoryError;
use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectorKind {
    Vcn,
    Subnet,
    RouteTable,
    Lpg,
    Nsg,
    SecurityList,
    LogGroup,
}

impl CollectorKind {
    /// Name accepted on the command line.
    pub fn as_arg(self) -> &'static str {
        match self {
            CollectorKind::Vcn => "vcn",
            CollectorKind::Subnet => "subnet",
            CollectorKind::RouteTable => "route-table",
            CollectorKind::Lpg => "lpg",
            CollectorKind::Nsg => "nsg",
            CollectorKind::SecurityList => "security-list",
            CollectorKind::LogGroup => "log-group",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CollectorKind::Vcn => "VCN data",
            CollectorKind::Subnet => "subnet data",
            CollectorKind::RouteTable => "route table data",
            CollectorKind::Lpg => "LPG data",
            CollectorKind::Nsg => "NSG data",
            CollectorKind::SecurityList => "security list data",
            CollectorKind::LogGroup => "log group data",
        }
    }

    /// `(cli resource, file suffix)` for kinds dumped with one list call.
    fn simple_listing(self) -> Option<(&'static [&'static str], &'static str)> {
        match self {
            CollectorKind::Vcn => Some((&["network", "vcn", "list"], "vcns")),
            CollectorKind::Subnet => Some((&["network", "subnet", "list"], "subnets")),
            CollectorKind::RouteTable => {
                Some((&["network", "route-table", "list"], "route_tables"))
            }
            CollectorKind::Lpg => Some((&["network", "local-peering-gateway", "list"], "lpgs")),
            _ => None,
        }
    }
}

/// Outcome of one collector run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub files_written: usize,
    pub failed_commands: usize,
}

/// `<region>_<compartment>_<suffix>.json`
pub fn dump_file_name(region: &str, compartment: &str, suffix: &str) -> String {
    format!("{}_{}_{}.json", region, compartment, suffix)
}

/// `(id, display-name)` of every item in a CLI `data` array.
fn data_items(value: &Value) -> Vec<(String, String)> {
    value
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id")?.as_str()?.to_string();
                    let name = item
                        .get("display-name")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown")
                        .to_string();
                    Some((id, name))
                })
                .collect()
        })
        .unwrap_or_default()
}

struct Dumper<'a> {
    client: &'a OciClient,
    summary: CollectSummary,
}

impl Dumper<'_> {
    /// Run a command; failures and empty output yield `None`.
    async fn fetch(&mut self, args: &[&str]) -> Option<Value> {
        match self.client.raw(args).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                info!("Command produced no output: oci {}", args.join(" "));
                None
            }
            Err(e) => {
                warn!("Command failed: {}", e);
                self.summary.failed_commands += 1;
                None
            }
        }
    }

    fn save(&mut self, dir: &Path, file_name: &str, value: &Value) {
        let path = dir.join(file_name);
        match report::json::save_json(value, &path) {
            Ok(path) => {
                println!("Data successfully saved to {}", path.display());
                self.summary.files_written += 1;
            }
            Err(e) => warn!("Failed to write {}: {:#}", path.display(), e),
        }
    }

    async fn fetch_and_save(&mut self, args: &[&str], dir: &Path, file_name: &str) -> Option<Value> {
        let value = self.fetch(args).await?;
        self.save(dir, file_name, &value);
        Some(value)
    }
}

/// Dump one resource kind for every subscribed region and compartment.
pub async fn run_collector(
    client: &OciClient,
    kind: CollectorKind,
    dir: &Path,
) -> Result<CollectSummary> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let regions: Vec<String> = client
        .list_region_subscriptions()
        .await?
        .into_iter()
        .map(|r| r.region_name)
        .collect();
    if regions.is_empty() {
        return Err(InventoryError::NoRegions.into());
    }

    let compartments = client.list_compartments().await?;
    if compartments.is_empty() {
        return Err(InventoryError::NoCompartments.into());
    }

    let mut dumper = Dumper {
        client,
        summary: CollectSummary::default(),
    };

    for region in &regions {
        println!("Processing region: {}", region);
        for compartment in &compartments {
            println!(
                "  Processing compartment: {} (ID: {}) in region: {}",
                compartment.name, compartment.id, region
            );
            collect_compartment(&mut dumper, kind, region, compartment, dir).await?;
        }
    }

    info!(
        kind = kind.as_arg(),
        files = dumper.summary.files_written,
        failures = dumper.summary.failed_commands,
        "Collection completed"
    );
    println!("{} collection completed.", kind.label());
    Ok(dumper.summary)
}

async fn collect_compartment(
    dumper: &mut Dumper<'_>,
    kind: CollectorKind,
    region: &str,
    compartment: &Compartment,
    dir: &Path,
) -> Result<()> {
    let scope = ["--compartment-id", compartment.id.as_str(), "--region", region, "--all"];

    if let Some((resource, suffix)) = kind.simple_listing() {
        let args: Vec<&str> = [resource, &scope[..]].concat();
        let file_name = dump_file_name(region, &compartment.name, suffix);
        dumper.fetch_and_save(&args, dir, &file_name).await;
        return Ok(());
    }

    match kind {
        CollectorKind::Nsg => {
            let region_dir = dir.join(format!("nsg_data_{}", region));
            std::fs::create_dir_all(&region_dir)
                .with_context(|| format!("Failed to create {}", region_dir.display()))?;

            let args = [&["network", "nsg", "list"][..], &scope[..]].concat();
            let file_name = dump_file_name(region, &compartment.name, "nsg");
            let Some(nsgs) = dumper.fetch_and_save(&args, &region_dir, &file_name).await else {
                println!(
                    "No NSGs found in compartment: {} for region: {}",
                    compartment.name, region
                );
                return Ok(());
            };

            for (nsg_id, nsg_name) in data_items(&nsgs) {
                println!("    Collecting NSG rules and VNICs for NSG: {} (ID: {})", nsg_name, nsg_id);
                let by_nsg = ["--nsg-id", nsg_id.as_str(), "--region", region, "--all"];

                let rules = [&["network", "nsg", "rules", "list"][..], &by_nsg[..]].concat();
                dumper
                    .fetch_and_save(&rules, &region_dir, &format!("nsg_{}_rules.json", nsg_id))
                    .await;

                let vnics = [&["network", "nsg", "vnics", "list"][..], &by_nsg[..]].concat();
                dumper
                    .fetch_and_save(&vnics, &region_dir, &format!("nsg_{}_vnics.json", nsg_id))
                    .await;
            }
        }
        CollectorKind::SecurityList => {
            let args = [&["network", "vcn", "list"][..], &scope[..]].concat();
            let Some(vcns) = dumper.fetch(&args).await else {
                println!(
                    "  No VCNs found for compartment: {} in region: {}",
                    compartment.name, region
                );
                return Ok(());
            };

            for (vcn_id, vcn_name) in data_items(&vcns) {
                println!("    Processing VCN: {} (ID: {}) in region: {}", vcn_name, vcn_id, region);
                let args = [
                    "network",
                    "security-list",
                    "list",
                    "--compartment-id",
                    compartment.id.as_str(),
                    "--vcn-id",
                    vcn_id.as_str(),
                    "--region",
                    region,
                    "--all",
                ];
                let file_name = format!("{}-{}-securitylist.json", region, vcn_id);
                if dumper.fetch_and_save(&args, dir, &file_name).await.is_none() {
                    println!("    No security lists found for VCN: {} (ID: {})", vcn_name, vcn_id);
                }
            }
        }
        CollectorKind::LogGroup => {
            let args = [&["logging", "log-group", "list"][..], &scope[..]].concat();
            let file_name = dump_file_name(region, &compartment.name, "log_groups");
            let Some(groups) = dumper.fetch_and_save(&args, dir, &file_name).await else {
                return Ok(());
            };

            for (group_id, _) in data_items(&groups) {
                let args = [
                    "logging",
                    "log",
                    "list",
                    "--log-group-id",
                    group_id.as_str(),
                    "--region",
                    region,
                    "--all",
                ];
                let suffix = format!("log_group_{}_logs", group_id);
                let file_name = dump_file_name(region, &compartment.name, &suffix);
                dumper.fetch_and_save(&args, dir, &file_name).await;
            }
        }
        CollectorKind::Vcn | CollectorKind::Subnet | CollectorKind::RouteTable | CollectorKind::Lpg => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dump_file_name() {
        assert_eq!(
            dump_file_name("ap-seoul-1", "prod", "vcns"),
            "ap-seoul-1_prod_vcns.json"
        );
    }

    #[test]
    fn test_as_arg_matches_value_enum() {
        for kind in CollectorKind::value_variants() {
            let name = kind.to_possible_value().map(|p| p.get_name().to_string());
            assert_eq!(name.as_deref(), Some(kind.as_arg()));
        }
    }

    #[test]
    fn test_data_items() {
        let value = json!({"data": [
            {"id": "ocid1.nsg.oc1..a", "display-name": "web"},
            {"id": "ocid1.nsg.oc1..b"},
            {"display-name": "no id"}
        ]});
        assert_eq!(
            data_items(&value),
            vec![
                ("ocid1.nsg.oc1..a".to_string(), "web".to_string()),
                ("ocid1.nsg.oc1..b".to_string(), "Unknown".to_string()),
            ]
        );
        assert!(data_items(&json!({})).is_empty());
    }

    #[test]
    fn test_simple_listings() {
        assert!(CollectorKind::Vcn.simple_listing().is_some());
        assert!(CollectorKind::Lpg.simple_listing().is_some());
        assert!(CollectorKind::Nsg.simple_listing().is_none());
        assert!(CollectorKind::LogGroup.simple_listing().is_none());
    }
}
