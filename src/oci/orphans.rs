//! Unused and orphaned resource report.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use super::client::OciClient;
use super::types::{AvailabilityDomain, Compartment, display_or_na, format_time};
use crate::checks;
use crate::output;
use crate::report::{self, Cell, NA, Table, ToRow};

pub const REPORT_FILE: &str = "unused_resources_report.xlsx";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Default)]
pub struct UnattachedVolume {
    pub compartment: String,
    pub name: String,
    pub id: String,
    pub size_gb: Option<i64>,
    pub state: String,
    pub created: String,
    pub last_backup: Option<String>,
}

impl ToRow for UnattachedVolume {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Volume Name",
        "Volume OCID",
        "Size (GB)",
        "State",
        "Created Time",
        "Last Backup Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.name),
            Cell::from(&self.id),
            Cell::opt_int(self.size_gb),
            Cell::from(&self.state),
            Cell::from(&self.created),
            Cell::opt(self.last_backup.clone()),
            Cell::from("Unattached"),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrphanedInstance {
    pub compartment: String,
    pub name: String,
    pub id: String,
    pub state: String,
    pub shape: String,
    pub created: String,
}

impl ToRow for OrphanedInstance {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Instance Name",
        "Instance OCID",
        "State",
        "Shape",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.name),
            Cell::from(&self.id),
            Cell::from(&self.state),
            Cell::from(&self.shape),
            Cell::from(&self.created),
            Cell::from("Orphaned"),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    ObjectStorage,
    FileStorage,
}

impl StorageKind {
    fn label(self) -> &'static str {
        match self {
            StorageKind::ObjectStorage => "Object Storage",
            StorageKind::FileStorage => "File Storage",
        }
    }
}

/// Bucket or file system with its usage remark.
#[derive(Debug, Clone, Default)]
pub struct StorageUsage {
    pub compartment: String,
    pub name: String,
    pub kind: StorageKind,
    pub size_gb: Option<f64>,
    pub state: String,
    pub created: String,
    pub remark: &'static str,
}

impl ToRow for StorageUsage {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Bucket Name / File System",
        "Type",
        "Size (GB)",
        "State",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.name),
            Cell::from(self.kind.label()),
            self.size_gb.map(Cell::Float).unwrap_or_else(|| Cell::from(NA)),
            Cell::from(&self.state),
            Cell::from(&self.created),
            Cell::from(self.remark),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnattachedVnic {
    pub compartment: String,
    pub name: String,
    pub id: String,
    pub state: String,
    pub created: String,
}

impl ToRow for UnattachedVnic {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "VNIC Name",
        "VNIC OCID",
        "State",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.name),
            Cell::from(&self.id),
            Cell::from(&self.state),
            Cell::from(&self.created),
            Cell::from("Unattached"),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrphanedLoadBalancer {
    pub compartment: String,
    pub name: String,
    pub id: String,
    pub state: String,
    pub created: String,
}

impl ToRow for OrphanedLoadBalancer {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Load Balancer Name",
        "Load Balancer OCID",
        "State",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.name),
            Cell::from(&self.id),
            Cell::from(&self.state),
            Cell::from(&self.created),
            Cell::from("Orphaned"),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct PublicIpUsage {
    pub compartment: String,
    pub ip_address: String,
    pub assigned_entity_id: Option<String>,
    pub state: String,
    pub created: String,
}

impl ToRow for PublicIpUsage {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Public IP",
        "Assigned To",
        "State",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        let assigned = self.assigned_entity_id.as_deref().filter(|id| !id.is_empty());
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.ip_address),
            Cell::from(assigned.unwrap_or("Unassigned")),
            Cell::from(&self.state),
            Cell::from(&self.created),
            Cell::from(checks::public_ip_remark(assigned)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayKind {
    #[default]
    Drg,
    IpSecConnection,
}

#[derive(Debug, Clone, Default)]
pub struct InactiveGateway {
    pub compartment: String,
    pub name: String,
    pub kind: GatewayKind,
    pub state: String,
    pub created: String,
}

impl ToRow for InactiveGateway {
    const HEADERS: &'static [&'static str] = &[
        "Compartment",
        "Resource Name",
        "Type",
        "State",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        let kind = match self.kind {
            GatewayKind::Drg => "DRG",
            GatewayKind::IpSecConnection => "IPSec Connection",
        };
        vec![
            Cell::from(&self.compartment),
            Cell::from(&self.name),
            Cell::from(kind),
            Cell::from(&self.state),
            Cell::from(&self.created),
            Cell::from("Inactive"),
        ]
    }
}

/// Rows of every sheet in the unused resources workbook.
#[derive(Debug, Default)]
pub struct OrphanReport {
    pub volumes: Vec<UnattachedVolume>,
    pub instances: Vec<OrphanedInstance>,
    pub storage: Vec<StorageUsage>,
    pub vnics: Vec<UnattachedVnic>,
    pub load_balancers: Vec<OrphanedLoadBalancer>,
    pub public_ips: Vec<PublicIpUsage>,
    pub gateways: Vec<InactiveGateway>,
}

impl OrphanReport {
    pub fn to_tables(&self) -> Result<Vec<Table>> {
        Ok(vec![
            Table::from_records("Unattached Volumes", &self.volumes)?,
            Table::from_records("Orphaned Instances", &self.instances)?,
            Table::from_records("Unused Storage", &self.storage)?,
            Table::from_records("Unattached VNICs", &self.vnics)?,
            Table::from_records("Orphaned Load Balancers", &self.load_balancers)?,
            Table::from_records("Unused Public IPs", &self.public_ips)?,
            Table::from_records("Inactive DRGs & VPNs", &self.gateways)?,
        ])
    }
}

/// Scan every active compartment and write the unused resources workbook.
pub async fn run_orphans(client: &OciClient, output_dir: &Path) -> Result<PathBuf> {
    output::print_collecting("unused OCI resources");
    let report = collect_orphans(client).await?;
    let tables = report.to_tables()?;

    let path = report::output_path(output_dir, REPORT_FILE)?;
    report::xlsx::save_workbook(&tables, &path)?;

    output::print_summary(&tables);
    output::print_saved(&path);
    Ok(path)
}

pub async fn collect_orphans(client: &OciClient) -> Result<OrphanReport> {
    let compartments: Vec<Compartment> = client
        .list_compartments()
        .await?
        .into_iter()
        .filter(Compartment::is_active)
        .collect();
    let availability_domains = client.list_availability_domains().await?;
    let namespace = client.get_namespace().await?;

    let mut report = OrphanReport::default();
    let pb = output::compartment_progress(compartments.len());

    for compartment in &compartments {
        pb.set_message(compartment.name.clone());
        info!(compartment = %compartment.name, "Checking compartment");

        collect_volumes(client, compartment, &mut report).await?;
        collect_instances(client, compartment, &mut report).await?;
        collect_storage(
            client,
            compartment,
            &namespace,
            &availability_domains,
            &mut report,
        )
        .await?;
        collect_vnics(client, compartment, &mut report).await?;
        collect_load_balancers(client, compartment, &mut report).await?;
        collect_public_ips(client, compartment, &mut report).await?;
        collect_gateways(client, compartment, &mut report).await?;

        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(report)
}

async fn collect_volumes(
    client: &OciClient,
    compartment: &Compartment,
    report: &mut OrphanReport,
) -> Result<()> {
    let volumes = client.list_volumes(&compartment.id).await?;
    let attached: HashSet<String> = client
        .list_volume_attachments(&compartment.id, None)
        .await?
        .into_iter()
        .filter(|a| a.is_live())
        .filter_map(|a| a.volume_id)
        .collect();

    for volume in volumes {
        let state = volume.lifecycle_state.as_deref().unwrap_or_default();
        if state != "AVAILABLE" || attached.contains(&volume.id) {
            continue;
        }

        let last_backup = match client.list_volume_backups(&compartment.id, &volume.id).await {
            Ok(backups) => backups
                .iter()
                .filter_map(|b| b.time_created.as_deref())
                .max()
                .map(|t| format_time(Some(t))),
            Err(e) => {
                warn!(volume = %volume.id, "Failed to list backups: {}", e);
                None
            }
        };

        report.volumes.push(UnattachedVolume {
            compartment: compartment.name.clone(),
            name: display_or_na(volume.display_name.as_deref()),
            id: volume.id.clone(),
            size_gb: volume.size_in_gbs,
            state: state.to_string(),
            created: format_time(volume.time_created.as_deref()),
            last_backup,
        });
    }
    Ok(())
}

async fn collect_instances(
    client: &OciClient,
    compartment: &Compartment,
    report: &mut OrphanReport,
) -> Result<()> {
    for instance in client.list_instances(&compartment.id).await? {
        let state = instance.lifecycle_state.clone().unwrap_or_default();
        if !checks::is_orphaned_instance(&state) {
            continue;
        }
        report.instances.push(OrphanedInstance {
            compartment: compartment.name.clone(),
            name: display_or_na(instance.display_name.as_deref()),
            id: instance.id,
            state,
            shape: display_or_na(instance.shape.as_deref()),
            created: format_time(instance.time_created.as_deref()),
        });
    }
    Ok(())
}

async fn collect_storage(
    client: &OciClient,
    compartment: &Compartment,
    namespace: &str,
    availability_domains: &[AvailabilityDomain],
    report: &mut OrphanReport,
) -> Result<()> {
    for summary in client.list_buckets(namespace, &compartment.id).await? {
        let details = client.get_bucket(namespace, &summary.name).await?;
        let count = details.as_ref().and_then(|d| d.approximate_count);
        let size = details
            .as_ref()
            .and_then(|d| d.approximate_size)
            .unwrap_or(0);

        report.storage.push(StorageUsage {
            compartment: compartment.name.clone(),
            name: summary.name,
            kind: StorageKind::ObjectStorage,
            size_gb: Some(size as f64 / BYTES_PER_GB),
            state: "Available".to_string(),
            created: format_time(summary.time_created.as_deref()),
            remark: checks::bucket_usage_remark(count),
        });
    }

    for ad in availability_domains {
        for fs in client.list_file_systems(&compartment.id, &ad.name).await? {
            let state = fs.lifecycle_state.clone().unwrap_or_default();
            report.storage.push(StorageUsage {
                compartment: compartment.name.clone(),
                name: display_or_na(fs.display_name.as_deref()),
                kind: StorageKind::FileStorage,
                size_gb: None,
                remark: checks::file_system_remark(&state),
                state,
                created: format_time(fs.time_created.as_deref()),
            });
        }
    }
    Ok(())
}

async fn collect_vnics(
    client: &OciClient,
    compartment: &Compartment,
    report: &mut OrphanReport,
) -> Result<()> {
    for attachment in client.list_vnic_attachments(&compartment.id, None).await? {
        let state = attachment.lifecycle_state.clone().unwrap_or_default();
        if !checks::is_unattached_vnic(&state) {
            continue;
        }
        report.vnics.push(UnattachedVnic {
            compartment: compartment.name.clone(),
            name: display_or_na(attachment.display_name.as_deref()),
            id: attachment.id,
            state,
            created: format_time(attachment.time_created.as_deref()),
        });
    }
    Ok(())
}

async fn collect_load_balancers(
    client: &OciClient,
    compartment: &Compartment,
    report: &mut OrphanReport,
) -> Result<()> {
    for lb in client.list_load_balancers(&compartment.id).await? {
        let state = lb.lifecycle_state.clone().unwrap_or_default();
        if !checks::is_orphaned_load_balancer(&state) {
            continue;
        }
        report.load_balancers.push(OrphanedLoadBalancer {
            compartment: compartment.name.clone(),
            name: display_or_na(lb.display_name.as_deref()),
            id: lb.id,
            state,
            created: format_time(lb.time_created.as_deref()),
        });
    }
    Ok(())
}

async fn collect_public_ips(
    client: &OciClient,
    compartment: &Compartment,
    report: &mut OrphanReport,
) -> Result<()> {
    for ip in client.list_public_ips(&compartment.id).await? {
        report.public_ips.push(PublicIpUsage {
            compartment: compartment.name.clone(),
            ip_address: display_or_na(ip.ip_address.as_deref()),
            assigned_entity_id: ip.assigned_entity_id,
            state: ip.lifecycle_state.unwrap_or_default(),
            created: format_time(ip.time_created.as_deref()),
        });
    }
    Ok(())
}

async fn collect_gateways(
    client: &OciClient,
    compartment: &Compartment,
    report: &mut OrphanReport,
) -> Result<()> {
    let drgs = client.list_drgs(&compartment.id).await?;
    let ipsec = client.list_ipsec_connections(&compartment.id).await?;

    let tagged = drgs
        .into_iter()
        .map(|g| (GatewayKind::Drg, g))
        .chain(ipsec.into_iter().map(|g| (GatewayKind::IpSecConnection, g)));

    for (kind, gateway) in tagged {
        let state = gateway.lifecycle_state.clone().unwrap_or_default();
        if !checks::is_inactive_gateway(&state) {
            continue;
        }
        report.gateways.push(InactiveGateway {
            compartment: compartment.name.clone(),
            name: display_or_na(gateway.display_name.as_deref()),
            kind,
            state,
            created: format_time(gateway.time_created.as_deref()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_width<T: ToRow>(record: &T) {
        assert_eq!(record.to_row().len(), T::HEADERS.len());
    }

    #[test]
    fn test_row_widths_match_headers() {
        assert_width(&UnattachedVolume::default());
        assert_width(&OrphanedInstance::default());
        assert_width(&StorageUsage::default());
        assert_width(&UnattachedVnic::default());
        assert_width(&OrphanedLoadBalancer::default());
        assert_width(&PublicIpUsage::default());
        assert_width(&InactiveGateway::default());
    }

    #[test]
    fn test_every_sheet_ends_with_remarks() {
        let report = OrphanReport::default();
        for table in report.to_tables().unwrap() {
            assert_eq!(table.headers.last().map(String::as_str), Some("Remarks"));
        }
    }

    #[test]
    fn test_public_ip_assignment() {
        let unassigned = PublicIpUsage {
            ip_address: "203.0.113.10".into(),
            ..Default::default()
        };
        let row = unassigned.to_row();
        assert_eq!(row[2], Cell::from("Unassigned"));
        assert_eq!(row[5], Cell::from("Unused"));

        let assigned = PublicIpUsage {
            assigned_entity_id: Some("ocid1.privateip.oc1..p".into()),
            ..unassigned
        };
        let row = assigned.to_row();
        assert_eq!(row[2], Cell::from("ocid1.privateip.oc1..p"));
        assert_eq!(row[5], Cell::from("In Use"));
    }

    #[test]
    fn test_storage_size_cells() {
        let fs = StorageUsage {
            kind: StorageKind::FileStorage,
            ..Default::default()
        };
        let row = fs.to_row();
        assert_eq!(row[2], Cell::from("File Storage"));
        assert_eq!(row[3], Cell::from("N/A"));

        let bucket = StorageUsage {
            size_gb: Some(2.5),
            ..Default::default()
        };
        assert_eq!(bucket.to_row()[3], Cell::Float(2.5));
    }

    #[test]
    fn test_gateway_type_labels() {
        let vpn = InactiveGateway {
            kind: GatewayKind::IpSecConnection,
            ..Default::default()
        };
        assert_eq!(vpn.to_row()[2], Cell::from("IPSec Connection"));
        assert_eq!(InactiveGateway::default().to_row()[2], Cell::from("DRG"));
    }
}
