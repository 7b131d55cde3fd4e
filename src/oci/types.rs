//! OCI resource shapes as printed by the CLI (`--output json`).
//!
//! Only the fields the reports read are declared; the CLI uses kebab-case
//! keys and omits or nulls fields freely, so everything beyond the id is
//! optional. List fields read an explicit `null` as empty.

use std::collections::HashMap;

use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::report::NA;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Compartment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

impl Compartment {
    pub const ROOT_NAME: &'static str = "Tenancy Root";

    /// The tenancy itself, scanned as a compartment.
    pub fn tenancy_root(tenancy_id: &str) -> Self {
        Self {
            id: tenancy_id.to_string(),
            name: Self::ROOT_NAME.to_string(),
            lifecycle_state: Some("ACTIVE".to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle_state.as_deref() == Some("ACTIVE")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegionSubscription {
    pub region_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityDomain {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vcn {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

/// Port range options (`tcp-options` / `udp-options`) are kept as raw JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IngressRule {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub tcp_options: Option<Value>,
    #[serde(default)]
    pub udp_options: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EgressRule {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub tcp_options: Option<Value>,
    #[serde(default)]
    pub udp_options: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityList {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingress_security_rules: Vec<IngressRule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub egress_security_rules: Vec<EgressRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkSecurityGroup {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NsgRule {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub tcp_options: Option<Value>,
    #[serde(default)]
    pub udp_options: Option<Value>,
}

impl NsgRule {
    /// Source for ingress rules, destination for egress rules.
    pub fn endpoint(&self) -> Option<&str> {
        match self.direction.as_deref() {
            Some("EGRESS") => self.destination.as_deref(),
            _ => self.source.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Instance {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub compartment_id: Option<String>,
    #[serde(default)]
    pub operating_system: Option<String>,
    #[serde(default)]
    pub operating_system_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VnicAttachment {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub vnic_id: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vnic {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nsg_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub size_in_gbs: Option<i64>,
    #[serde(default)]
    pub is_auto_tune_enabled: Option<bool>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VolumeAttachment {
    pub id: String,
    #[serde(default)]
    pub volume_id: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

impl VolumeAttachment {
    /// Attachments in these states keep their volume in use.
    pub fn is_live(&self) -> bool {
        matches!(
            self.lifecycle_state.as_deref(),
            Some("ATTACHED") | Some("ATTACHING")
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VolumeBackup {
    pub id: String,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BucketSummary {
    pub name: String,
    #[serde(default)]
    pub time_created: Option<String>,
}

/// `oci os bucket get` with approximate count/size fields requested.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub approximate_count: Option<i64>,
    #[serde(default)]
    pub approximate_size: Option<i64>,
    #[serde(default)]
    pub public_access_type: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSummary {
    pub name: String,
}

/// `oci os object list` wraps objects in `{"data": [...], "prefixes": [...]}`
/// like other lists, but tolerate the older nested form too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ObjectListing {
    Flat(Vec<ObjectSummary>),
    Nested { objects: Vec<ObjectSummary> },
}

impl ObjectListing {
    pub fn into_objects(self) -> Vec<ObjectSummary> {
        match self {
            ObjectListing::Flat(objects) | ObjectListing::Nested { objects } => objects,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileSystem {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoadBalancer {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub shape_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublicIp {
    pub id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub assigned_entity_id: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

/// DRGs and IPSec connections share the fields the reports read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Gateway {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AutonomousDatabase {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub db_workload: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub last_successful_login_time: Option<String>,
}

/// Row of `oci iam group list-users`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroupMember {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub compartment_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub statements: Vec<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Problem {
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
}

impl Problem {
    /// Labels joined with `, `, or `"N/A"` when there are none.
    pub fn label_text(&self) -> String {
        if self.labels.is_empty() {
            NA.to_string()
        } else {
            self.labels.join(", ")
        }
    }
}

/// Name or `"N/A"`.
pub fn display_or_na(name: Option<&str>) -> String {
    name.unwrap_or(NA).to_string()
}

/// Render a CLI timestamp as `YYYY-MM-DD HH:MM:SS`, dropping the offset.
///
/// Values that do not parse are returned unchanged; missing values become
/// `"N/A"`.
pub fn format_time(value: Option<&str>) -> String {
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => NA.to_string(),
    }
}
