//! Typed OCI calls over a [`CliRunner`].

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::cli::{CliRunner, command_line};
use super::types::{
    AutonomousDatabase, AvailabilityDomain, Bucket, BucketSummary, Compartment, FileSystem,
    Gateway, Group, GroupMember, Image, Instance, LoadBalancer, NetworkSecurityGroup,
    NsgRule, ObjectListing, ObjectSummary, Policy, Problem, PublicIp, Recommendation,
    RegionSubscription, SecurityList, User, Vcn, Vnic, VnicAttachment, Volume, VolumeAttachment,
    VolumeBackup,
};
use crate::error::InventoryError;

/// OCI access scoped to one tenancy.
pub struct OciClient {
    runner: Box<dyn CliRunner>,
    tenancy_id: String,
    region: Option<String>,
}

impl OciClient {
    pub fn new(runner: Box<dyn CliRunner>, tenancy_id: &str, region: Option<String>) -> Self {
        Self {
            runner,
            tenancy_id: tenancy_id.to_string(),
            region,
        }
    }

    pub fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    /// Home region from the config profile, if known.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Run a command and return its raw JSON, untouched.
    pub async fn raw(&self, args: &[&str]) -> Result<Option<Value>, InventoryError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run_json(&args).await
    }

    /// Run a list command with `--all` and decode its `data` array.
    async fn list<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>, InventoryError> {
        let mut args = args.to_vec();
        args.push("--all");
        self.list_page(&args).await
    }

    /// Run a list command as-is (no `--all`) and decode its `data` array.
    async fn list_page<T: DeserializeOwned>(
        &self,
        args: &[&str],
    ) -> Result<Vec<T>, InventoryError> {
        Ok(self.data(args).await?.unwrap_or_default())
    }

    async fn get<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Option<T>, InventoryError> {
        self.data(args).await
    }

    async fn data<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Option<T>, InventoryError> {
        let Some(value) = self.raw(args).await? else {
            return Ok(None);
        };
        let command = command_line("oci", &args.iter().map(|a| a.to_string()).collect::<Vec<_>>());
        decode_data(&command, value)
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    pub async fn list_region_subscriptions(
        &self,
    ) -> Result<Vec<RegionSubscription>, InventoryError> {
        self.list(&["iam", "region-subscription", "list"]).await
    }

    /// Every compartment below the tenancy, at any depth.
    pub async fn list_compartments(&self) -> Result<Vec<Compartment>, InventoryError> {
        self.list(&[
            "iam",
            "compartment",
            "list",
            "--compartment-id",
            &self.tenancy_id,
            "--compartment-id-in-subtree",
            "true",
            "--access-level",
            "ANY",
        ])
        .await
    }

    /// Active compartments plus the tenancy root.
    pub async fn list_active_compartments_with_root(
        &self,
    ) -> Result<Vec<Compartment>, InventoryError> {
        let mut compartments: Vec<Compartment> = self
            .list_compartments()
            .await?
            .into_iter()
            .filter(Compartment::is_active)
            .collect();
        compartments.push(Compartment::tenancy_root(&self.tenancy_id));
        Ok(compartments)
    }

    pub async fn list_availability_domains(
        &self,
    ) -> Result<Vec<AvailabilityDomain>, InventoryError> {
        self.list_page(&[
            "iam",
            "availability-domain",
            "list",
            "--compartment-id",
            &self.tenancy_id,
        ])
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, InventoryError> {
        self.list(&["iam", "user", "list", "--compartment-id", &self.tenancy_id])
            .await
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, InventoryError> {
        self.list(&["iam", "group", "list", "--compartment-id", &self.tenancy_id])
            .await
    }

    pub async fn list_group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupMember>, InventoryError> {
        self.list(&[
            "iam",
            "group",
            "list-users",
            "--compartment-id",
            &self.tenancy_id,
            "--group-id",
            group_id,
        ])
        .await
    }

    pub async fn list_policies(&self, compartment_id: &str) -> Result<Vec<Policy>, InventoryError> {
        self.list(&["iam", "policy", "list", "--compartment-id", compartment_id])
            .await
    }

    // -----------------------------------------------------------------------
    // Networking
    // -----------------------------------------------------------------------

    pub async fn list_vcns(&self, compartment_id: &str) -> Result<Vec<Vcn>, InventoryError> {
        self.list(&["network", "vcn", "list", "--compartment-id", compartment_id])
            .await
    }

    pub async fn list_security_lists(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<SecurityList>, InventoryError> {
        self.list(&[
            "network",
            "security-list",
            "list",
            "--compartment-id",
            compartment_id,
        ])
        .await
    }

    pub async fn list_nsgs(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<NetworkSecurityGroup>, InventoryError> {
        self.list(&["network", "nsg", "list", "--compartment-id", compartment_id])
            .await
    }

    pub async fn list_nsg_rules(&self, nsg_id: &str) -> Result<Vec<NsgRule>, InventoryError> {
        self.list(&["network", "nsg", "rules", "list", "--nsg-id", nsg_id])
            .await
    }

    pub async fn list_public_ips(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<PublicIp>, InventoryError> {
        self.list(&[
            "network",
            "public-ip",
            "list",
            "--compartment-id",
            compartment_id,
            "--scope",
            "REGION",
        ])
        .await
    }

    pub async fn list_drgs(&self, compartment_id: &str) -> Result<Vec<Gateway>, InventoryError> {
        self.list(&["network", "drg", "list", "--compartment-id", compartment_id])
            .await
    }

    pub async fn list_ipsec_connections(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<Gateway>, InventoryError> {
        self.list(&[
            "network",
            "ip-sec-connection",
            "list",
            "--compartment-id",
            compartment_id,
        ])
        .await
    }

    pub async fn get_vnic(&self, vnic_id: &str) -> Result<Option<Vnic>, InventoryError> {
        self.get(&["network", "vnic", "get", "--vnic-id", vnic_id])
            .await
    }

    // -----------------------------------------------------------------------
    // Compute and block storage
    // -----------------------------------------------------------------------

    pub async fn list_instances(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<Instance>, InventoryError> {
        self.list(&["compute", "instance", "list", "--compartment-id", compartment_id])
            .await
    }

    pub async fn get_image(&self, image_id: &str) -> Result<Option<Image>, InventoryError> {
        self.get(&["compute", "image", "get", "--image-id", image_id])
            .await
    }

    /// Newest image for an operating system and version.
    pub async fn newest_image(
        &self,
        operating_system: &str,
        operating_system_version: &str,
    ) -> Result<Option<Image>, InventoryError> {
        let images: Vec<Image> = self
            .list_page(&[
                "compute",
                "image",
                "list",
                "--compartment-id",
                &self.tenancy_id,
                "--operating-system",
                operating_system,
                "--operating-system-version",
                operating_system_version,
                "--sort-by",
                "TIMECREATED",
                "--sort-order",
                "DESC",
                "--limit",
                "1",
            ])
            .await?;
        Ok(images.into_iter().next())
    }

    pub async fn list_vnic_attachments(
        &self,
        compartment_id: &str,
        instance_id: Option<&str>,
    ) -> Result<Vec<VnicAttachment>, InventoryError> {
        let mut args = vec![
            "compute",
            "vnic-attachment",
            "list",
            "--compartment-id",
            compartment_id,
        ];
        if let Some(instance_id) = instance_id {
            args.extend(["--instance-id", instance_id]);
        }
        self.list(&args).await
    }

    pub async fn list_volumes(&self, compartment_id: &str) -> Result<Vec<Volume>, InventoryError> {
        self.list(&["bv", "volume", "list", "--compartment-id", compartment_id])
            .await
    }

    pub async fn list_volume_attachments(
        &self,
        compartment_id: &str,
        volume_id: Option<&str>,
    ) -> Result<Vec<VolumeAttachment>, InventoryError> {
        let mut args = vec![
            "compute",
            "volume-attachment",
            "list",
            "--compartment-id",
            compartment_id,
        ];
        if let Some(volume_id) = volume_id {
            args.extend(["--volume-id", volume_id]);
        }
        self.list(&args).await
    }

    pub async fn list_volume_backups(
        &self,
        compartment_id: &str,
        volume_id: &str,
    ) -> Result<Vec<VolumeBackup>, InventoryError> {
        self.list(&[
            "bv",
            "backup",
            "list",
            "--compartment-id",
            compartment_id,
            "--volume-id",
            volume_id,
        ])
        .await
    }

    // -----------------------------------------------------------------------
    // Object and file storage
    // -----------------------------------------------------------------------

    pub async fn get_namespace(&self) -> Result<String, InventoryError> {
        let args = ["os", "ns", "get"];
        self.get(&args).await?.ok_or_else(|| InventoryError::OciOutput {
            command: command_line("oci", &args.map(String::from)),
            details: "no namespace returned".to_string(),
        })
    }

    pub async fn list_buckets(
        &self,
        namespace: &str,
        compartment_id: &str,
    ) -> Result<Vec<BucketSummary>, InventoryError> {
        self.list(&[
            "os",
            "bucket",
            "list",
            "--namespace-name",
            namespace,
            "--compartment-id",
            compartment_id,
        ])
        .await
    }

    /// Bucket details including approximate object count and size.
    pub async fn get_bucket(
        &self,
        namespace: &str,
        bucket: &str,
    ) -> Result<Option<Bucket>, InventoryError> {
        self.get(&[
            "os",
            "bucket",
            "get",
            "--namespace-name",
            namespace,
            "--bucket-name",
            bucket,
            "--fields",
            "approximateCount",
            "--fields",
            "approximateSize",
        ])
        .await
    }

    pub async fn list_objects(
        &self,
        namespace: &str,
        bucket: &str,
    ) -> Result<Vec<ObjectSummary>, InventoryError> {
        let listing: Option<ObjectListing> = self
            .get(&[
                "os",
                "object",
                "list",
                "--namespace-name",
                namespace,
                "--bucket-name",
                bucket,
                "--all",
            ])
            .await?;
        Ok(listing.map(ObjectListing::into_objects).unwrap_or_default())
    }

    pub async fn put_object(
        &self,
        namespace: &str,
        bucket: &str,
        file: &Path,
        object_name: &str,
    ) -> Result<(), InventoryError> {
        let file = file.display().to_string();
        self.raw(&[
            "os",
            "object",
            "put",
            "--namespace-name",
            namespace,
            "--bucket-name",
            bucket,
            "--file",
            &file,
            "--name",
            object_name,
            "--force",
        ])
        .await?;
        debug!(bucket, object_name, "Uploaded object");
        Ok(())
    }

    pub async fn list_file_systems(
        &self,
        compartment_id: &str,
        availability_domain: &str,
    ) -> Result<Vec<FileSystem>, InventoryError> {
        self.list(&[
            "fs",
            "file-system",
            "list",
            "--compartment-id",
            compartment_id,
            "--availability-domain",
            availability_domain,
        ])
        .await
    }

    // -----------------------------------------------------------------------
    // Load balancers and databases
    // -----------------------------------------------------------------------

    pub async fn list_load_balancers(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<LoadBalancer>, InventoryError> {
        self.list(&["lb", "load-balancer", "list", "--compartment-id", compartment_id])
            .await
    }

    pub async fn list_autonomous_databases(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<AutonomousDatabase>, InventoryError> {
        self.list(&[
            "db",
            "autonomous-database",
            "list",
            "--compartment-id",
            compartment_id,
        ])
        .await
    }

    // -----------------------------------------------------------------------
    // Advisor, Cloud Guard and logging
    // -----------------------------------------------------------------------

    pub async fn list_recommendations(&self) -> Result<Vec<Recommendation>, InventoryError> {
        self.list(&[
            "optimizer",
            "recommendation",
            "list",
            "--compartment-id",
            &self.tenancy_id,
            "--compartment-id-in-subtree",
            "true",
        ])
        .await
    }

    pub async fn list_problems(&self) -> Result<Vec<Problem>, InventoryError> {
        self.list(&[
            "cloud-guard",
            "problem",
            "list",
            "--compartment-id",
            &self.tenancy_id,
            "--compartment-id-in-subtree",
            "true",
            "--access-level",
            "ANY",
        ])
        .await
    }
}

/// Unwrap the CLI's `{"data": ...}` envelope.
fn decode_data<T: DeserializeOwned>(command: &str, value: Value) -> Result<Option<T>, InventoryError> {
    let data = match value {
        Value::Object(mut map) => map.remove("data"),
        _ => None,
    };
    match data {
        None | Some(Value::Null) => Ok(None),
        Some(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(|e| InventoryError::OciOutput {
                command: command.to_string(),
                details: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every command with the same JSON and records the arguments.
    struct StaticRunner {
        response: Option<Value>,
        calls: std::sync::Arc<Mutex<Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl CliRunner for StaticRunner {
        async fn run_json(&self, args: &[String]) -> Result<Option<Value>, InventoryError> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(self.response.clone())
        }
    }

    fn client(response: Option<Value>) -> (OciClient, std::sync::Arc<Mutex<Vec<Vec<String>>>>) {
        let calls = std::sync::Arc::new(Mutex::new(Vec::new()));
        let runner = StaticRunner {
            response,
            calls: calls.clone(),
        };
        (
            OciClient::new(Box::new(runner), "ocid1.tenancy.oc1..t", None),
            calls,
        )
    }

    #[test]
    fn test_decode_data_envelope() {
        let vcns: Option<Vec<Vcn>> = decode_data(
            "oci network vcn list",
            json!({"data": [{"id": "v1", "display-name": "main", "cidr-block": "10.0.0.0/16"}]}),
        )
        .unwrap();
        assert_eq!(vcns.unwrap()[0].cidr_block.as_deref(), Some("10.0.0.0/16"));
    }

    #[test]
    fn test_decode_data_missing_or_null() {
        let none: Option<Vec<Vcn>> = decode_data("cmd", json!({"opc-next-page": "x"})).unwrap();
        assert!(none.is_none());
        let null: Option<Vec<Vcn>> = decode_data("cmd", json!({"data": null})).unwrap();
        assert!(null.is_none());
    }

    #[test]
    fn test_decode_data_wrong_shape() {
        let err = decode_data::<Vec<Vcn>>("oci network vcn list", json!({"data": "oops"})).unwrap_err();
        assert!(matches!(err, InventoryError::OciOutput { .. }));
    }

    #[tokio::test]
    async fn test_list_appends_all_flag() {
        let (client, calls) = client(Some(json!({"data": []})));
        let vcns = client.list_vcns("ocid1.compartment.oc1..c").await.unwrap();
        assert!(vcns.is_empty());

        let calls = calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec![
                "network",
                "vcn",
                "list",
                "--compartment-id",
                "ocid1.compartment.oc1..c",
                "--all"
            ]
        );
    }

    #[tokio::test]
    async fn test_problems_cover_compartment_subtree() {
        let (client, calls) = client(Some(json!({"data": [
            {"resource-name": "bucket", "labels": null}
        ]})));
        let problems = client.list_problems().await.unwrap();
        assert_eq!(problems[0].label_text(), "N/A");

        let calls = calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec![
                "cloud-guard",
                "problem",
                "list",
                "--compartment-id",
                "ocid1.tenancy.oc1..t",
                "--compartment-id-in-subtree",
                "true",
                "--access-level",
                "ANY",
                "--all"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_empty_list() {
        let (client, _) = client(None);
        assert!(client.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_availability_domains_skip_all_flag() {
        let (client, calls) = client(Some(json!({"data": [{"name": "AD-1"}]})));
        let ads = client.list_availability_domains().await.unwrap();
        assert_eq!(ads[0].name, "AD-1");
        assert!(!calls.lock().unwrap()[0].contains(&"--all".to_string()));
    }

    #[tokio::test]
    async fn test_active_compartments_with_root() {
        let (client, _) = client(Some(json!({"data": [
            {"id": "c1", "name": "prod", "lifecycle-state": "ACTIVE"},
            {"id": "c2", "name": "old", "lifecycle-state": "DELETED"}
        ]})));
        let compartments = client.list_active_compartments_with_root().await.unwrap();
        let names: Vec<&str> = compartments.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["prod", "Tenancy Root"]);
        assert_eq!(compartments[1].id, "ocid1.tenancy.oc1..t");
    }

    #[tokio::test]
    async fn test_get_namespace() {
        let (client, _) = client(Some(json!({"data": "axaxnpcrorw5"})));
        assert_eq!(client.get_namespace().await.unwrap(), "axaxnpcrorw5");

        let (client, _) = client(None);
        assert!(client.get_namespace().await.is_err());
    }
}
