//! Resource discovery with best-practice findings.
//!
//! Every active compartment (plus the tenancy root) is scanned for the
//! selected resource kinds. Each resource may add findings; the results are
//! written as JSON, a findings workbook with charts, a per-kind summary and a
//! compute instance CSV. With `--cloud-guard` the scan also inspects instance
//! images and attached NSGs and pulls Cloud Advisor and Cloud Guard data.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::client::OciClient;
use super::types::{Compartment, Instance, Problem, Recommendation, display_or_na};
use crate::checks;
use crate::error::InventoryError;
use crate::output;
use crate::report::{self, Cell, ChartKind, ChartSpec, Table};

pub const RESOURCES_JSON: &str = "oci_resources.json";
pub const RESOURCES_XLSX: &str = "oci_resources.xlsx";
pub const SUMMARY_JSON: &str = "oci_resource_summary.json";
pub const COMPUTE_CSV: &str = "compute_instances.csv";

const RECOMMENDATION: &str = "Refer to OCI best practices.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum ResourceKind {
    Vcn,
    Compute,
    Block,
    Bucket,
    /// Listed together with buckets.
    #[value(skip)]
    BucketObject,
    Adb,
    Lb,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Vcn,
        ResourceKind::Compute,
        ResourceKind::Block,
        ResourceKind::Bucket,
        ResourceKind::BucketObject,
        ResourceKind::Adb,
        ResourceKind::Lb,
    ];

    /// Sheet name and JSON key.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Vcn => "VCNs",
            ResourceKind::Compute => "Compute Instances",
            ResourceKind::Block => "Block Volumes",
            ResourceKind::Bucket => "Buckets",
            ResourceKind::BucketObject => "Bucket Objects",
            ResourceKind::Adb => "Autonomous Databases",
            ResourceKind::Lb => "Load Balancers",
        }
    }

    fn headers(self) -> &'static [&'static str] {
        match self {
            ResourceKind::BucketObject => &["Compartment", "Bucket", "Object"],
            ResourceKind::Lb => &["Compartment", "Name", "ID", "Shape", "Subnets"],
            _ => &["Compartment", "Name", "ID"],
        }
    }

    /// Whether a `--type` filter includes this kind.
    pub fn selected_by(self, filter: Option<ResourceKind>) -> bool {
        match filter {
            None => true,
            Some(ResourceKind::Bucket) => {
                matches!(self, ResourceKind::Bucket | ResourceKind::BucketObject)
            }
            Some(kind) => kind == self,
        }
    }
}

/// A discovered resource as written to `oci_resources.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveredResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Vec<String>>,
}

impl DiscoveredResource {
    fn named(name: Option<&str>, id: &str) -> Self {
        Self {
            name: Some(display_or_na(name)),
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn row(&self, kind: ResourceKind, compartment: &str) -> Vec<Cell> {
        let text = |v: &Option<String>| Cell::opt(v.clone());
        match kind {
            ResourceKind::BucketObject => vec![
                Cell::from(compartment),
                text(&self.bucket_name),
                text(&self.object_name),
            ],
            ResourceKind::Lb => vec![
                Cell::from(compartment),
                text(&self.name),
                text(&self.id),
                text(&self.shape),
                Cell::from(self.subnets.as_deref().unwrap_or_default().join(", ")),
            ],
            _ => vec![Cell::from(compartment), text(&self.name), text(&self.id)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub kind: ResourceKind,
    pub message: String,
}

/// Resources and findings of one compartment.
#[derive(Debug, Clone, Default)]
pub struct CompartmentScan {
    pub name: String,
    pub resources: BTreeMap<ResourceKind, Vec<DiscoveredResource>>,
    pub findings: Vec<Finding>,
}

impl CompartmentScan {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn add(&mut self, kind: ResourceKind, resource: DiscoveredResource) {
        self.resources.entry(kind).or_default().push(resource);
    }

    fn flag(&mut self, kind: ResourceKind, message: String) {
        debug!(compartment = %self.name, "{}", message);
        self.findings.push(Finding { kind, message });
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    pub kind: Option<ResourceKind>,
    pub compartment_name: Option<String>,
    pub cloud_guard: bool,
    pub upload_bucket: Option<String>,
}

/// Everything one discovery run found.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub kinds: Vec<ResourceKind>,
    pub compartments: Vec<CompartmentScan>,
    /// Present only when Cloud Advisor/Cloud Guard were queried.
    pub advisor: Option<Vec<Recommendation>>,
    pub cloud_guard: Option<Vec<Problem>>,
}

impl DiscoveryReport {
    /// Total resources per selected kind, in sheet order.
    pub fn resource_counts(&self) -> Vec<(ResourceKind, usize)> {
        self.kinds
            .iter()
            .map(|kind| {
                let count = self
                    .compartments
                    .iter()
                    .map(|c| c.resources.get(kind).map_or(0, Vec::len))
                    .sum();
                (*kind, count)
            })
            .collect()
    }

    /// Finding counts per kind, skipping kinds without findings.
    pub fn findings_by_type(&self) -> Vec<(ResourceKind, usize)> {
        let mut counts: BTreeMap<ResourceKind, usize> = BTreeMap::new();
        for finding in self.compartments.iter().flat_map(|c| &c.findings) {
            *counts.entry(finding.kind).or_default() += 1;
        }
        counts.into_iter().collect()
    }

    pub fn finding_count(&self) -> usize {
        self.compartments.iter().map(|c| c.findings.len()).sum()
    }

    /// Document written to `oci_resources.json`.
    pub fn to_json(&self) -> Value {
        let mut resources = serde_json::Map::new();
        let mut findings = serde_json::Map::new();

        for scan in &self.compartments {
            let by_kind = resources
                .entry(scan.name.clone())
                .or_insert_with(|| json!({}));
            if let Value::Object(by_kind) = by_kind {
                for (kind, items) in &scan.resources {
                    let entry = by_kind
                        .entry(kind.label().to_string())
                        .or_insert_with(|| json!([]));
                    if let Value::Array(list) = entry {
                        list.extend(items.iter().map(|i| json!(i)));
                    }
                }
            }

            let messages = findings
                .entry(scan.name.clone())
                .or_insert_with(|| json!([]));
            if let Value::Array(list) = messages {
                list.extend(scan.findings.iter().map(|f| json!(f.message)));
            }
        }

        let mut doc = json!({ "resources": resources, "findings": findings });
        if let Some(advisor) = &self.advisor {
            doc["cloud_advisor_recommendations"] = advisor
                .iter()
                .map(|r| {
                    json!({
                        "Name": r.name,
                        "Recommendation": r.description.as_deref().unwrap_or("No description available"),
                    })
                })
                .collect();
        }
        if let Some(problems) = &self.cloud_guard {
            doc["cloud_guard_findings"] = problems
                .iter()
                .map(|p| json!({ "Name": p.resource_name, "Description": p.label_text() }))
                .collect();
        }
        doc
    }

    /// Per-kind totals written to `oci_resource_summary.json`.
    pub fn summary_json(&self) -> Value {
        let summary: serde_json::Map<String, Value> = self
            .resource_counts()
            .into_iter()
            .map(|(kind, count)| (kind.label().to_string(), json!(count)))
            .collect();
        Value::Object(summary)
    }

    /// Compute instances as written to `compute_instances.csv`.
    pub fn compute_table(&self) -> Result<Table> {
        let mut table = Table::new("Compute Instances", &["Compartment", "Name", "ID"]);
        for scan in &self.compartments {
            for instance in scan.resources.get(&ResourceKind::Compute).into_iter().flatten() {
                table.push_row(instance.row(ResourceKind::Compute, &scan.name))?;
            }
        }
        Ok(table)
    }

    pub fn to_tables(&self) -> Result<Vec<Table>> {
        let mut tables = Vec::new();

        let mut summary = Table::new("Findings Summary", &["Compartment", "Issue", "Recommendation"])
            .with_highlight(1);
        for scan in &self.compartments {
            for finding in &scan.findings {
                summary.push_row(vec![
                    Cell::from(&scan.name),
                    Cell::from(&finding.message),
                    Cell::from(RECOMMENDATION),
                ])?;
            }
        }
        tables.push(summary);

        let mut by_type = Table::new("Findings by Type", &["Resource Type", "Number of Issues"])
            .with_chart(
                ChartSpec::new(ChartKind::Column, "Findings by Resource Type", (1, 3))
                    .with_axes("Resource Type", "Number of Issues"),
            );
        for (kind, count) in self.findings_by_type() {
            by_type.push_row(vec![Cell::from(kind.label()), Cell::from(count)])?;
        }
        tables.push(by_type);

        if let Some(advisor) = &self.advisor {
            let mut sheet = Table::new("Cloud Advisor", &["Name", "Recommendation"]);
            if advisor.is_empty() {
                sheet.push_message("No Cloud Advisor recommendations found.");
            }
            for r in advisor {
                sheet.push_row(vec![
                    Cell::from(&r.name),
                    Cell::from(r.description.as_deref().unwrap_or("No description available")),
                ])?;
            }
            tables.push(sheet);
        }

        if let Some(problems) = &self.cloud_guard {
            let mut sheet = Table::new("Cloud Guard", &["Resource Name", "Description"]);
            if problems.is_empty() {
                sheet.push_message("No Cloud Guard findings found.");
            }
            for p in problems {
                sheet.push_row(vec![Cell::opt(p.resource_name.clone()), Cell::from(p.label_text())])?;
            }
            tables.push(sheet);
        }

        for kind in &self.kinds {
            let mut sheet = Table::new(kind.label(), kind.headers());
            for scan in &self.compartments {
                for item in scan.resources.get(kind).into_iter().flatten() {
                    sheet.push_row(item.row(*kind, &scan.name))?;
                }
            }
            tables.push(sheet);
        }

        let mut visual = Table::new("Visualizations", &["Resource Type", "Count"])
            .with_chart(ChartSpec::new(ChartKind::Pie, "Resource Distribution", (1, 3)))
            .with_chart(
                ChartSpec::new(ChartKind::Column, "Resource Counts", (19, 3))
                    .with_axes("Resource Type", "Count"),
            );
        for (kind, count) in self.resource_counts() {
            visual.push_row(vec![Cell::from(kind.label()), Cell::from(count)])?;
        }
        tables.push(visual);

        Ok(tables)
    }
}

/// Scan, then write every discovery artifact. Returns the written paths.
pub async fn run_discovery(
    client: &OciClient,
    options: &DiscoverOptions,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let namespace = client.get_namespace().await?;
    let report = discover(client, options, &namespace).await?;

    let mut written = Vec::new();

    let json_path = report::output_path(output_dir, RESOURCES_JSON)?;
    report::json::save_json(&report.to_json(), &json_path)?;
    output::print_saved(&json_path);
    written.push(json_path.clone());

    let tables = report.to_tables()?;
    let xlsx_path = report::output_path(output_dir, RESOURCES_XLSX)?;
    report::xlsx::save_workbook(&tables, &xlsx_path)?;
    output::print_saved(&xlsx_path);
    written.push(xlsx_path);

    let summary_path = report::output_path(output_dir, SUMMARY_JSON)?;
    report::json::save_json(&report.summary_json(), &summary_path)?;
    written.push(summary_path);

    let csv_path = report::output_path(output_dir, COMPUTE_CSV)?;
    report::csv::save_csv(&report.compute_table()?, &csv_path)?;
    output::print_saved(&csv_path);
    written.push(csv_path);

    output::print_summary(&tables);
    if report.finding_count() > 0 {
        output::print_warning(&format!("{} findings", report.finding_count()));
    }

    if let Some(bucket) = &options.upload_bucket {
        client
            .put_object(&namespace, bucket, &json_path, RESOURCES_JSON)
            .await?;
        println!(
            "Results uploaded to Object Storage bucket '{}' as '{}'.",
            bucket, RESOURCES_JSON
        );
    }

    Ok(written)
}

/// Scan all matching compartments.
pub async fn discover(
    client: &OciClient,
    options: &DiscoverOptions,
    namespace: &str,
) -> Result<DiscoveryReport> {
    let compartments: Vec<Compartment> = client
        .list_active_compartments_with_root()
        .await?
        .into_iter()
        .filter(|c| {
            options
                .compartment_name
                .as_deref()
                .is_none_or(|name| name == c.name)
        })
        .collect();

    let mut report = DiscoveryReport {
        kinds: ResourceKind::ALL
            .into_iter()
            .filter(|k| k.selected_by(options.kind))
            .collect(),
        ..Default::default()
    };

    let mut images = ImageCheck::default();
    let pb = output::compartment_progress(compartments.len());
    for compartment in &compartments {
        pb.set_message(compartment.name.clone());
        info!(compartment = %compartment.name, "Discovering resources");

        let scan = scan_compartment(client, compartment, namespace, options, &report.kinds, &mut images)
            .await?;
        report.compartments.push(scan);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if options.cloud_guard {
        report.advisor = Some(tolerate("Cloud Advisor", client.list_recommendations().await)?);
        report.cloud_guard = Some(tolerate("Cloud Guard", client.list_problems().await)?);
    }

    for (kind, count) in report.resource_counts() {
        output::print_found(count, kind.label());
    }
    Ok(report)
}

/// Service errors become an empty result with a warning.
fn tolerate<T>(service: &str, result: Result<Vec<T>, InventoryError>) -> Result<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.is_oci_service_error() => {
            warn!("{} Service Error: {}", service, e);
            output::print_warning(&format!("{} Service Error: {}", service, e));
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn scan_compartment(
    client: &OciClient,
    compartment: &Compartment,
    namespace: &str,
    options: &DiscoverOptions,
    kinds: &[ResourceKind],
    images: &mut ImageCheck,
) -> Result<CompartmentScan> {
    let mut scan = CompartmentScan::new(&compartment.name);
    let id = compartment.id.as_str();

    if kinds.contains(&ResourceKind::Vcn) {
        for vcn in client.list_vcns(id).await? {
            let name = display_or_na(vcn.display_name.as_deref());
            if checks::vcn_has_open_cidr(vcn.cidr_block.as_deref()) {
                scan.flag(ResourceKind::Vcn, format!("VCN '{}' has an open CIDR block.", name));
            }
            scan.add(ResourceKind::Vcn, DiscoveredResource::named(Some(name.as_str()), &vcn.id));
        }
    }

    if kinds.contains(&ResourceKind::Compute) {
        for instance in client.list_instances(id).await? {
            check_instance(&mut scan, &instance);
            if options.cloud_guard {
                deep_check_instance(client, &mut scan, compartment, &instance, images).await?;
            }
            scan.add(
                ResourceKind::Compute,
                DiscoveredResource::named(instance.display_name.as_deref(), &instance.id),
            );
        }
    }

    if kinds.contains(&ResourceKind::Block) {
        for volume in client.list_volumes(id).await? {
            let name = display_or_na(volume.display_name.as_deref());
            let attachments = client.list_volume_attachments(id, Some(&volume.id)).await?;
            if !attachments.iter().any(|a| a.is_live()) {
                scan.flag(
                    ResourceKind::Block,
                    format!("Volume '{}' is not attached to any instance.", name),
                );
            }
            if volume.is_auto_tune_enabled != Some(true) {
                scan.flag(
                    ResourceKind::Block,
                    format!("Volume '{}' does not have auto-tune enabled.", name),
                );
            }
            scan.add(ResourceKind::Block, DiscoveredResource::named(Some(name.as_str()), &volume.id));
        }
    }

    if kinds.contains(&ResourceKind::Bucket) {
        for bucket in client.list_buckets(namespace, id).await? {
            let details = client.get_bucket(namespace, &bucket.name).await?;
            let access = details.as_ref().and_then(|d| d.public_access_type.as_deref());
            if checks::allows_public_access(access) {
                scan.flag(
                    ResourceKind::Bucket,
                    format!("Bucket '{}' allows public access.", bucket.name),
                );
            }

            for object in client.list_objects(namespace, &bucket.name).await? {
                scan.add(
                    ResourceKind::BucketObject,
                    DiscoveredResource {
                        bucket_name: Some(bucket.name.clone()),
                        object_name: Some(object.name),
                        ..Default::default()
                    },
                );
            }
            scan.add(
                ResourceKind::Bucket,
                DiscoveredResource {
                    name: Some(bucket.name),
                    ..Default::default()
                },
            );
        }
    }

    if kinds.contains(&ResourceKind::Adb) {
        for adb in client.list_autonomous_databases(id).await? {
            let name = display_or_na(adb.display_name.as_deref());
            if checks::is_non_oltp_workload(adb.db_workload.as_deref()) {
                scan.flag(
                    ResourceKind::Adb,
                    format!("ADB '{}' is not optimized for OLTP workloads.", name),
                );
            }
            scan.add(ResourceKind::Adb, DiscoveredResource::named(Some(name.as_str()), &adb.id));
        }
    }

    if kinds.contains(&ResourceKind::Lb) {
        for lb in client.list_load_balancers(id).await? {
            let name = display_or_na(lb.display_name.as_deref());
            let shape = lb.shape_name.clone().unwrap_or_default();
            if !checks::is_flexible_lb_shape(&shape) {
                scan.flag(
                    ResourceKind::Lb,
                    format!("Load Balancer '{}' is not using a flexible shape.", name),
                );
            }
            scan.add(
                ResourceKind::Lb,
                DiscoveredResource {
                    name: Some(name),
                    id: Some(lb.id),
                    shape: lb.shape_name,
                    subnets: Some(lb.subnet_ids),
                    ..Default::default()
                },
            );
        }
    }

    Ok(scan)
}

/// Findings that only need the instance listing.
pub fn check_instance(scan: &mut CompartmentScan, instance: &Instance) {
    let name = display_or_na(instance.display_name.as_deref());
    let metadata = instance.metadata.as_ref();

    if instance.shape.as_deref().is_some_and(checks::is_basic_shape) {
        scan.flag(
            ResourceKind::Compute,
            format!("Instance '{}' is using a basic shape.", name),
        );
    }
    if !checks::has_ssh_keys(metadata) {
        scan.flag(
            ResourceKind::Compute,
            format!(
                "Instance '{}' does not have SSH key-based authentication configured.",
                name
            ),
        );
    }
    if checks::password_login_enabled(metadata) {
        scan.flag(
            ResourceKind::Compute,
            format!("Instance '{}' has password-based login enabled.", name),
        );
    }
    if !checks::logging_agent_configured(metadata) {
        scan.flag(
            ResourceKind::Compute,
            format!("Instance '{}' does not have logging agents configured.", name),
        );
    }
}

/// Image freshness, cached per image and per OS release.
#[derive(Debug, Default)]
struct ImageCheck {
    outdated: HashMap<String, bool>,
    newest: HashMap<(String, String), Option<String>>,
}

impl ImageCheck {
    async fn is_outdated(&mut self, client: &OciClient, image_id: &str) -> Result<bool> {
        if let Some(known) = self.outdated.get(image_id) {
            return Ok(*known);
        }

        let Some(image) = client.get_image(image_id).await? else {
            self.outdated.insert(image_id.to_string(), false);
            return Ok(false);
        };

        let newest = match (&image.operating_system, &image.operating_system_version) {
            (Some(os), Some(version)) if image.compartment_id.is_none() => {
                let key = (os.clone(), version.clone());
                if !self.newest.contains_key(&key) {
                    let found = client.newest_image(os, version).await?.map(|i| i.id);
                    self.newest.insert(key.clone(), found);
                }
                self.newest.get(&key).cloned().flatten()
            }
            _ => None,
        };

        let outdated = checks::is_outdated_platform_image(
            image.compartment_id.as_deref(),
            &image.id,
            newest.as_deref(),
        );
        self.outdated.insert(image_id.to_string(), outdated);
        Ok(outdated)
    }
}

/// Image and NSG checks that need extra calls per instance.
async fn deep_check_instance(
    client: &OciClient,
    scan: &mut CompartmentScan,
    compartment: &Compartment,
    instance: &Instance,
    images: &mut ImageCheck,
) -> Result<()> {
    let name = display_or_na(instance.display_name.as_deref());

    if let Some(image_id) = &instance.image_id
        && images.is_outdated(client, image_id).await?
    {
        scan.flag(
            ResourceKind::Compute,
            format!("Instance '{}' is not using the latest platform image.", name),
        );
    }

    let attachments = client
        .list_vnic_attachments(&compartment.id, Some(&instance.id))
        .await?;
    for vnic_id in attachments.iter().filter_map(|a| a.vnic_id.as_deref()) {
        let Some(vnic) = client.get_vnic(vnic_id).await? else {
            continue;
        };
        for nsg_id in &vnic.nsg_ids {
            match client.list_nsg_rules(nsg_id).await {
                Ok(rules) => {
                    let open = rules.iter().any(|r| {
                        checks::is_unrestricted_ingress(
                            r.direction.as_deref().unwrap_or_default(),
                            r.source.as_deref(),
                        )
                    });
                    if open {
                        scan.flag(
                            ResourceKind::Compute,
                            format!("Instance '{}' NSG allows unrestricted ingress.", name),
                        );
                    }
                }
                Err(e) if e.is_oci_service_error() => {
                    scan.flag(
                        ResourceKind::Compute,
                        format!("Error fetching rules for NSG ID {}: {}", nsg_id, e),
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}
