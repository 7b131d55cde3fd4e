//! OCI report commands against a scripted CLI.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tempfile::TempDir;

use cloudinv::error::InventoryError;
use cloudinv::oci::cli::CliRunner;
use cloudinv::oci::client::OciClient;
use cloudinv::oci::collect::{self, CollectorKind};
use cloudinv::oci::discovery::{self, DiscoverOptions, ResourceKind};
use cloudinv::oci::{iam, orphans, policy, security, vcn};
use cloudinv::report::{Cell, ToRow};

const TENANCY: &str = "ocid1.tenancy.oc1..t";
const PROD: &str = "ocid1.compartment.oc1..prod";

#[derive(Clone)]
enum Reply {
    Data(Value),
    Fail(String),
}

/// Answers the first route whose pattern occurs in the joined arguments.
/// Unmatched commands print nothing, like an empty listing.
#[derive(Clone, Default)]
struct ScriptedOci {
    routes: Vec<(String, Reply)>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedOci {
    fn ok(mut self, pattern: &str, data: Value) -> Self {
        self.routes
            .push((pattern.to_string(), Reply::Data(json!({ "data": data }))));
        self
    }

    fn fail(mut self, pattern: &str, details: &str) -> Self {
        self.routes
            .push((pattern.to_string(), Reply::Fail(details.to_string())));
        self
    }

    fn with_compartments(self) -> Self {
        self.ok(
            "iam compartment list",
            json!([
                {"id": PROD, "name": "prod", "lifecycle-state": "ACTIVE"},
                {"id": "ocid1.compartment.oc1..gone", "name": "gone", "lifecycle-state": "DELETED"}
            ]),
        )
    }

    fn client(self) -> OciClient {
        OciClient::new(Box::new(self), TENANCY, Some("ap-seoul-1".to_string()))
    }
}

#[async_trait]
impl CliRunner for ScriptedOci {
    async fn run_json(&self, args: &[String]) -> Result<Option<Value>, InventoryError> {
        let line = args.join(" ");
        self.calls.lock().unwrap().push(line.clone());
        match self.routes.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
            Some((_, Reply::Data(value))) => Ok(Some(value.clone())),
            Some((_, Reply::Fail(details))) => Err(InventoryError::OciCli {
                command: format!("oci {}", line),
                details: details.clone(),
            }),
            None => Ok(None),
        }
    }
}

fn in_prod(command: &str) -> String {
    format!("{} --compartment-id {}", command, PROD)
}

#[tokio::test]
async fn test_orphans_report() {
    let client = ScriptedOci::default()
        .with_compartments()
        .ok("iam availability-domain list", json!([{"name": "AD-1"}]))
        .ok("os ns get", json!("tenantns"))
        .ok(
            &in_prod("bv volume list"),
            json!([
                {"id": "vol-data", "display-name": "data", "lifecycle-state": "AVAILABLE",
                 "size-in-gbs": 50, "time-created": "2024-01-02T03:04:05+00:00"},
                {"id": "vol-boot", "display-name": "boot", "lifecycle-state": "AVAILABLE"}
            ]),
        )
        .ok(
            &in_prod("compute volume-attachment list"),
            json!([{"id": "att", "volume-id": "vol-boot", "lifecycle-state": "ATTACHED"}]),
        )
        .ok(
            "bv backup list",
            json!([
                {"id": "b1", "time-created": "2024-03-01T10:00:00+00:00"},
                {"id": "b2", "time-created": "2024-05-01T10:00:00+00:00"}
            ]),
        )
        .ok(
            &in_prod("compute instance list"),
            json!([
                {"id": "i-old", "display-name": "old-vm", "lifecycle-state": "STOPPED",
                 "shape": "VM.Standard2.1"},
                {"id": "i-live", "display-name": "web", "lifecycle-state": "RUNNING"}
            ]),
        )
        .ok(
            &in_prod("network public-ip list"),
            json!([{"id": "ip1", "ip-address": "203.0.113.7", "lifecycle-state": "AVAILABLE"}]),
        )
        .client();

    let report = orphans::collect_orphans(&client).await.unwrap();

    assert_eq!(report.volumes.len(), 1);
    assert_eq!(report.volumes[0].id, "vol-data");
    assert_eq!(report.volumes[0].compartment, "prod");
    assert_eq!(report.volumes[0].last_backup.as_deref(), Some("2024-05-01 10:00:00"));

    assert_eq!(report.instances.len(), 1);
    assert_eq!(report.instances[0].name, "old-vm");

    let ip = report.public_ips[0].to_row();
    assert_eq!(ip[2], Cell::from("Unassigned"));
    assert_eq!(ip[5], Cell::from("Unused"));

    let tables = report.to_tables().unwrap();
    assert_eq!(tables.len(), 7);
    assert_eq!(tables[0].name, "Unattached Volumes");
}

#[tokio::test]
async fn test_orphans_workbook_written() {
    let out = TempDir::new().unwrap();
    let client = ScriptedOci::default()
        .with_compartments()
        .ok("os ns get", json!("tenantns"))
        .client();

    let path = orphans::run_orphans(&client, out.path()).await.unwrap();
    assert_eq!(path, out.path().join(orphans::REPORT_FILE));
    assert!(path.is_file());
}

#[tokio::test]
async fn test_iam_sheets() {
    let client = ScriptedOci::default()
        .ok(
            "iam user list",
            json!([
                {"id": "u1", "name": "alice", "lifecycle-state": "ACTIVE",
                 "last-successful-login-time": "2024-05-01T10:00:00+00:00"},
                {"id": "u2", "name": "bob", "lifecycle-state": "INACTIVE"}
            ]),
        )
        .ok("iam group list-users", json!([{"id": "u1", "name": "alice"}]))
        .ok("iam group list", json!([{"id": "g1", "name": "Administrators"}]))
        .ok(
            "iam policy list",
            json!([{"id": "p1", "name": "Admins", "compartment-id": TENANCY,
                    "statements": ["Allow group Administrators to manage all-resources in tenancy",
                                   "Allow group Auditors to inspect all-resources in tenancy"]}]),
        )
        .client();

    let tables = iam::collect_iam(&client).await.unwrap();
    assert_eq!(tables[0].name, "IAM Users");
    assert_eq!(tables[1].name, "IAM Policies");

    let users = tables[0].rows();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0][3], Cell::from("Administrators"));
    assert_eq!(users[0][4], Cell::from("2024-05-01 10:00:00"));
    assert_eq!(users[1][3], Cell::from("No Group"));
    assert_eq!(users[1][4], Cell::from("N/A"));

    assert_eq!(tables[1].len(), 2);
}

#[tokio::test]
async fn test_security_csv_flags_open_rules() {
    let out = TempDir::new().unwrap();
    let client = ScriptedOci::default()
        .with_compartments()
        .ok(
            &in_prod("network security-list list"),
            json!([{
                "id": "sl1",
                "display-name": "Default Security List",
                "ingress-security-rules": [{"source": "0.0.0.0/0", "protocol": "6"}],
                "egress-security-rules": [{"destination": "10.0.0.0/8", "protocol": "all"}]
            }]),
        )
        .ok(&in_prod("network nsg list"), json!([{"id": "nsg1", "display-name": "web-nsg"}]))
        .ok(
            "network nsg rules list --nsg-id nsg1",
            json!([{"direction": "EGRESS", "protocol": "all", "destination": "0.0.0.0/0"}]),
        )
        .client();

    let path = security::run_security(&client, out.path()).await.unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "Compartment,Type,Name,Rule Type,Protocol,Source/Destination,Options,Remarks"
    );
    assert_eq!(lines.len(), 4);
    assert!(lines[1].ends_with("Open to all (Risky)"));
    assert!(lines[2].ends_with("Safe"));
    assert!(lines[3].starts_with("prod,NSG,web-nsg,EGRESS"));
    assert!(!text.contains("gone"));
}

#[tokio::test]
async fn test_vcns_include_tenancy_root() {
    let client = ScriptedOci::default()
        .with_compartments()
        .ok(&in_prod("network vcn list"), json!([{"id": "vcn-prod", "display-name": "main"}]))
        .ok(
            &format!("network vcn list --compartment-id {}", TENANCY),
            json!([{"id": "vcn-root"}]),
        )
        .client();

    let details = vcn::collect_vcns(&client).await.unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].compartment, "prod");
    assert_eq!(details[0].region, "ap-seoul-1");
    assert_eq!(details[1].compartment, "Tenancy Root");
    assert_eq!(details[1].vcn_name, "N/A");
}

fn discovery_fixture() -> ScriptedOci {
    ScriptedOci::default()
        .with_compartments()
        .ok("os ns get", json!("tenantns"))
        .ok(
            &in_prod("compute instance list"),
            json!([{
                "id": "i1",
                "display-name": "web",
                "shape": "VM.Optimized3.Flex",
                "image-id": "img-old",
                "metadata": {
                    "ssh_authorized_keys": "ssh-ed25519 AAAA",
                    "disable_password_auth": "true",
                    "logging_agent": "configured"
                }
            }]),
        )
        .ok(
            "compute image get --image-id img-old",
            json!({"id": "img-old", "operating-system": "Oracle Linux",
                   "operating-system-version": "8"}),
        )
        .ok("compute image list", json!([{"id": "img-new"}]))
        .ok("compute vnic-attachment list", json!([{"id": "a1", "vnic-id": "vnic1"}]))
        .ok("network vnic get", json!({"id": "vnic1", "nsg-ids": ["nsg-open", "nsg-broken"]}))
        .ok(
            "network nsg rules list --nsg-id nsg-open",
            json!([{"direction": "INGRESS", "protocol": "all", "source": "0.0.0.0/0"}]),
        )
        .fail("network nsg rules list --nsg-id nsg-broken", "NotAuthorizedOrNotFound")
        .ok(
            &in_prod("network vcn list"),
            json!([{"id": "vcn1", "display-name": "flat", "cidr-block": "0.0.0.0/0"}]),
        )
        .fail("optimizer recommendation list", "ServiceError: 404")
        .ok(
            "cloud-guard problem list",
            json!([
                {"resource-name": "bucket-x", "labels": ["PUBLIC", "CIS_OCI"]},
                {"resource-name": "vcn-y", "labels": null}
            ]),
        )
}

#[tokio::test]
async fn test_discovery_deep_checks() {
    let fixture = discovery_fixture();
    let calls = fixture.calls.clone();
    let client = fixture.client();
    let options = DiscoverOptions {
        cloud_guard: true,
        ..Default::default()
    };

    let report = discovery::discover(&client, &options, "tenantns").await.unwrap();

    let prod = report
        .compartments
        .iter()
        .find(|c| c.name == "prod")
        .unwrap();
    let messages: Vec<&str> = prod.findings.iter().map(|f| f.message.as_str()).collect();
    assert!(messages.contains(&"VCN 'flat' has an open CIDR block."));
    assert!(messages.contains(&"Instance 'web' is not using the latest platform image."));
    assert!(messages.contains(&"Instance 'web' NSG allows unrestricted ingress."));
    assert!(
        messages
            .iter()
            .any(|m| m.starts_with("Error fetching rules for NSG ID nsg-broken:"))
    );
    assert_eq!(report.finding_count(), 4);

    assert_eq!(report.advisor.as_deref().map(<[_]>::len), Some(0));
    let doc = report.to_json();
    assert_eq!(
        doc["cloud_guard_findings"][0]["Description"],
        json!("PUBLIC, CIS_OCI")
    );
    assert_eq!(doc["cloud_guard_findings"][1]["Description"], json!("N/A"));
    assert_eq!(doc["cloud_advisor_recommendations"], json!([]));

    let calls = calls.lock().unwrap();
    let newest_lookups = calls
        .iter()
        .filter(|c| c.starts_with("compute image list"))
        .count();
    assert_eq!(newest_lookups, 1);

    let problems = calls
        .iter()
        .find(|c| c.starts_with("cloud-guard problem list"))
        .unwrap();
    assert!(problems.contains("--compartment-id-in-subtree true"));
    assert!(problems.contains("--access-level ANY"));
}

#[tokio::test]
async fn test_discovery_type_filter_and_files() {
    let out = TempDir::new().unwrap();
    let client = discovery_fixture().client();
    let options = DiscoverOptions {
        kind: Some(ResourceKind::Compute),
        compartment_name: Some("prod".to_string()),
        ..Default::default()
    };

    let paths = discovery::run_discovery(&client, &options, out.path())
        .await
        .unwrap();
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|p| p.is_file()));

    let doc: Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join(discovery::RESOURCES_JSON)).unwrap())
            .unwrap();
    assert_eq!(doc["resources"]["prod"]["Compute Instances"][0]["id"], json!("i1"));
    assert!(doc["resources"].get("Tenancy Root").is_none());
    assert!(doc.get("cloud_guard_findings").is_none());

    let summary: Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join(discovery::SUMMARY_JSON)).unwrap())
            .unwrap();
    assert_eq!(summary, json!({"Compute Instances": 1}));

    let csv = std::fs::read_to_string(out.path().join(discovery::COMPUTE_CSV)).unwrap();
    assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["Compartment,Name,ID", "prod,web,i1"]);
}

#[tokio::test]
async fn test_policies_files() {
    let out = TempDir::new().unwrap();
    let client = ScriptedOci::default()
        .ok(
            &format!("iam policy list --compartment-id {}", TENANCY),
            json!([{"id": "p1", "name": "Admins", "compartment-id": TENANCY,
                    "statements": ["Allow group Administrators to manage all-resources in tenancy"],
                    "lifecycle-state": "ACTIVE"}]),
        )
        .client();
    let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    let paths = policy::run_policies(&client, out.path(), today).await.unwrap();
    assert_eq!(
        paths,
        vec![
            out.path().join("tenancy_policies_tenancy_2024-06-03.csv"),
            out.path().join("tenancy_policies_tenancy_2024-06-03.xlsx"),
        ]
    );
    assert!(paths.iter().all(|p| p.is_file()));
}

#[tokio::test]
async fn test_policies_empty_writes_nothing() {
    let out = TempDir::new().unwrap();
    let client = ScriptedOci::default().client();
    let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    let paths = policy::run_policies(&client, out.path(), today).await.unwrap();
    assert!(paths.is_empty());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

fn collector_fixture() -> ScriptedOci {
    ScriptedOci::default()
        .ok("iam region-subscription list", json!([{"region-name": "ap-seoul-1"}]))
        .ok("iam compartment list", json!([{"id": PROD, "name": "prod"}]))
}

#[tokio::test]
async fn test_nsg_collector_layout() {
    let out = TempDir::new().unwrap();
    let client = collector_fixture()
        .ok("network nsg list", json!([{"id": "nsg1", "display-name": "web"}]))
        .ok("network nsg rules list --nsg-id nsg1", json!([{"direction": "INGRESS"}]))
        .fail("network nsg vnics list", "ServiceError")
        .client();

    let summary = collect::run_collector(&client, CollectorKind::Nsg, out.path())
        .await
        .unwrap();
    assert_eq!(summary.files_written, 2);
    assert_eq!(summary.failed_commands, 1);

    let region_dir = out.path().join("nsg_data_ap-seoul-1");
    let listing: Value =
        serde_json::from_str(&std::fs::read_to_string(region_dir.join("ap-seoul-1_prod_nsg.json")).unwrap())
            .unwrap();
    assert_eq!(listing["data"][0]["id"], json!("nsg1"));
    assert!(region_dir.join("nsg_nsg1_rules.json").is_file());
    assert!(!region_dir.join("nsg_nsg1_vnics.json").exists());
}

#[tokio::test]
async fn test_security_list_collector_skips_vcn_dump() {
    let out = TempDir::new().unwrap();
    let fixture = collector_fixture()
        .ok("network vcn list", json!([{"id": "vcn1", "display-name": "main"}]))
        .ok("network security-list list", json!([{"id": "sl1"}]));
    let calls = fixture.calls.clone();
    let client = fixture.client();

    let summary = collect::run_collector(&client, CollectorKind::SecurityList, out.path())
        .await
        .unwrap();
    assert_eq!(summary.files_written, 1);
    assert!(out.path().join("ap-seoul-1-vcn1-securitylist.json").is_file());

    let calls = calls.lock().unwrap();
    let listing = calls
        .iter()
        .find(|c| c.starts_with("network security-list list"))
        .unwrap();
    assert!(listing.contains("--vcn-id vcn1"));
    assert!(listing.contains("--region ap-seoul-1"));
}

#[tokio::test]
async fn test_log_group_collector_dumps_logs() {
    let out = TempDir::new().unwrap();
    let client = collector_fixture()
        .ok("logging log-group list", json!([{"id": "lg1", "display-name": "flows"}]))
        .ok("logging log list --log-group-id lg1", json!([{"id": "log1"}]))
        .client();

    collect::run_collector(&client, CollectorKind::LogGroup, out.path())
        .await
        .unwrap();
    assert!(out.path().join("ap-seoul-1_prod_log_groups.json").is_file());
    assert!(out.path().join("ap-seoul-1_prod_log_group_lg1_logs.json").is_file());
}

#[tokio::test]
async fn test_collector_requires_regions() {
    let out = TempDir::new().unwrap();
    let client = ScriptedOci::default().client();

    let err = collect::run_collector(&client, CollectorKind::Vcn, out.path())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<InventoryError>(),
        Some(InventoryError::NoRegions)
    ));
}
