//! AWS inventory collection and workbook export.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aws_sdk_costexplorer::types::{DateInterval, Granularity};
use aws_smithy_types::DateTime;
use tracing::{debug, info};

use super::client::AwsClients;
use super::types::{
    CostEntry, CostPeriod, Distribution, EbsVolume, Ec2Instance, HostedZone, IamRole, IamUser,
    LambdaFunction, RdsInstance, S3Bucket, Vpc,
};
use crate::error::InventoryError;
use crate::output;
use crate::report::{self, Table, ToRow};

pub const INVENTORY_REPORT: &str = "aws_inventory_report.xlsx";
pub const ADVANCED_REPORT: &str = "aws_inventory_advance_report.xlsx";
pub const S3_REPORT: &str = "s3_buckets_list.xlsx";

/// Options for the inventory workbook.
#[derive(Debug, Clone)]
pub struct InventoryOptions {
    pub advanced: bool,
    pub cost_period: CostPeriod,
}

/// Collect every resource type and write the inventory workbook.
pub async fn run_inventory(
    clients: &AwsClients,
    options: &InventoryOptions,
    output_dir: &Path,
) -> Result<PathBuf> {
    info!(region = clients.region(), "Starting AWS inventory collection");
    println!("Starting AWS inventory collection ({})...", clients.region());

    let mut tables = vec![
        sheet("EC2 Instances", "EC2 instances", list_instances(clients)).await?,
        sheet("VPCs", "VPCs", list_vpcs(clients)).await?,
        sheet("EBS Volumes", "EBS volumes", list_volumes(clients)).await?,
        sheet("S3 Buckets", "S3 buckets", list_buckets(clients)).await?,
        sheet("RDS Databases", "RDS instances", list_db_instances(clients)).await?,
        sheet("IAM Users", "IAM users", list_iam_users(clients)).await?,
        sheet("IAM Roles", "IAM roles", list_iam_roles(clients)).await?,
        sheet("Lambda Functions", "Lambda functions", list_functions(clients)).await?,
    ];

    if options.advanced {
        tables.push(sheet("Route 53", "hosted zones", list_hosted_zones(clients)).await?);
        tables.push(
            sheet(
                "CloudFront",
                "CloudFront distributions",
                list_distributions(clients),
            )
            .await?,
        );
        tables.push(
            sheet(
                "AWS Cost Report",
                "cost periods",
                get_costs(clients, &options.cost_period),
            )
            .await?,
        );
    }

    let file_name = if options.advanced {
        ADVANCED_REPORT
    } else {
        INVENTORY_REPORT
    };
    let path = report::output_path(output_dir, file_name)?;
    report::xlsx::save_workbook(&tables, &path)?;

    output::print_summary(&tables);
    output::print_saved(&path);
    Ok(path)
}

/// Write the standalone S3 bucket list workbook.
pub async fn run_s3_list(clients: &AwsClients, output_dir: &Path) -> Result<PathBuf> {
    let buckets = list_buckets(clients).await?;
    let table = Table::from_records("S3 Buckets", &buckets)?;
    output::print_found(table.len(), "S3 buckets");

    let path = report::output_path(output_dir, S3_REPORT)?;
    report::xlsx::save_workbook(std::slice::from_ref(&table), &path)?;
    output::print_saved(&path);
    Ok(path)
}

/// Run one collector, then build its sheet and report the row count.
async fn sheet<T: ToRow>(
    name: &str,
    label: &str,
    records: impl Future<Output = Result<Vec<T>>>,
) -> Result<Table> {
    output::print_collecting(label);
    let records = records.await?;
    let table = Table::from_records(name, &records)?;
    output::print_found(table.len(), label);
    Ok(table)
}

// ---------------------------------------------------------------------------
// Collectors
// ---------------------------------------------------------------------------

async fn list_instances(clients: &AwsClients) -> Result<Vec<Ec2Instance>> {
    let response = clients
        .ec2
        .describe_instances()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .reservations()
        .iter()
        .flat_map(|r| r.instances())
        .map(ec2_instance_from_sdk)
        .collect())
}

async fn list_vpcs(clients: &AwsClients) -> Result<Vec<Vpc>> {
    let response = clients
        .ec2
        .describe_vpcs()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .vpcs()
        .iter()
        .map(|v| Vpc {
            vpc_id: v.vpc_id().unwrap_or_default().to_string(),
            cidr_block: v.cidr_block().map(String::from),
            is_default: v.is_default(),
        })
        .collect())
}

async fn list_volumes(clients: &AwsClients) -> Result<Vec<EbsVolume>> {
    let response = clients
        .ec2
        .describe_volumes()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .volumes()
        .iter()
        .map(ebs_volume_from_sdk)
        .collect())
}

async fn list_buckets(clients: &AwsClients) -> Result<Vec<S3Bucket>> {
    let response = clients
        .s3
        .list_buckets()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .buckets()
        .iter()
        .map(|b| S3Bucket {
            name: b.name().unwrap_or_default().to_string(),
            creation_date: b.creation_date().and_then(format_timestamp),
        })
        .collect())
}

async fn list_db_instances(clients: &AwsClients) -> Result<Vec<RdsInstance>> {
    let response = clients
        .rds
        .describe_db_instances()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .db_instances()
        .iter()
        .map(|db| RdsInstance {
            identifier: db.db_instance_identifier().unwrap_or_default().to_string(),
            class: db.db_instance_class().map(String::from),
            engine: db.engine().map(String::from),
            status: db.db_instance_status().map(String::from),
            endpoint: db.endpoint().and_then(|e| e.address()).map(String::from),
            publicly_accessible: db.publicly_accessible(),
        })
        .collect())
}

async fn list_iam_users(clients: &AwsClients) -> Result<Vec<IamUser>> {
    let response = clients
        .iam
        .list_users()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .users()
        .iter()
        .map(|u| IamUser {
            user_name: u.user_name().to_string(),
            arn: u.arn().to_string(),
            create_date: format_timestamp(u.create_date()),
        })
        .collect())
}

async fn list_iam_roles(clients: &AwsClients) -> Result<Vec<IamRole>> {
    let response = clients
        .iam
        .list_roles()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .roles()
        .iter()
        .map(|r| IamRole {
            role_name: r.role_name().to_string(),
            arn: r.arn().to_string(),
            create_date: format_timestamp(r.create_date()),
        })
        .collect())
}

async fn list_functions(clients: &AwsClients) -> Result<Vec<LambdaFunction>> {
    let response = clients
        .lambda
        .list_functions()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .functions()
        .iter()
        .map(|f| LambdaFunction {
            name: f.function_name().unwrap_or_default().to_string(),
            runtime: f.runtime().map(|r| r.as_str().to_string()),
            handler: f.handler().map(String::from),
            memory_size: f.memory_size(),
            timeout: f.timeout(),
        })
        .collect())
}

async fn list_hosted_zones(clients: &AwsClients) -> Result<Vec<HostedZone>> {
    let response = clients
        .route53
        .list_hosted_zones()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .hosted_zones()
        .iter()
        .map(|z| HostedZone {
            id: z.id().to_string(),
            name: z.name().to_string(),
            record_count: z.resource_record_set_count(),
        })
        .collect())
}

async fn list_distributions(clients: &AwsClients) -> Result<Vec<Distribution>> {
    let response = clients
        .cloudfront
        .list_distributions()
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    // An account without distributions returns no list at all
    let Some(list) = response.distribution_list() else {
        return Ok(Vec::new());
    };

    Ok(list
        .items()
        .iter()
        .map(|d| Distribution {
            id: d.id().to_string(),
            domain_name: d.domain_name().to_string(),
            status: d.status().to_string(),
        })
        .collect())
}

async fn get_costs(clients: &AwsClients, period: &CostPeriod) -> Result<Vec<CostEntry>> {
    debug!(
        "Querying blended cost from {} to {}",
        period.start_str(),
        period.end_str()
    );

    let interval = DateInterval::builder()
        .start(period.start_str())
        .end(period.end_str())
        .build()
        .context("Failed to build cost period")?;

    let response = clients
        .cost_explorer
        .get_cost_and_usage()
        .time_period(interval)
        .granularity(Granularity::Monthly)
        .metrics("BlendedCost")
        .send()
        .await
        .map_err(|e| InventoryError::aws(module_path!(), e))?;

    Ok(response
        .results_by_time()
        .iter()
        .map(|result| {
            let blended = result.total().and_then(|t| t.get("BlendedCost"));
            CostEntry {
                billing_month: result
                    .time_period()
                    .map(|p| p.start().to_string())
                    .unwrap_or_default(),
                amount: blended.and_then(|m| m.amount()).map(String::from),
                unit: blended.and_then(|m| m.unit()).map(String::from),
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

fn ec2_instance_from_sdk(instance: &aws_sdk_ec2::types::Instance) -> Ec2Instance {
    let tags = instance.tags();
    let tags = if tags.is_empty() {
        None
    } else {
        Some(
            tags.iter()
                .map(|t| {
                    format!(
                        "{}={}",
                        t.key().unwrap_or_default(),
                        t.value().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    Ec2Instance {
        instance_id: instance.instance_id().unwrap_or_default().to_string(),
        instance_type: instance.instance_type().map(|t| t.as_str().to_string()),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string()),
        public_ip: instance.public_ip_address().map(String::from),
        private_ip: instance.private_ip_address().map(String::from),
        launch_time: instance.launch_time().and_then(format_timestamp),
        tags,
    }
}

fn ebs_volume_from_sdk(volume: &aws_sdk_ec2::types::Volume) -> EbsVolume {
    EbsVolume {
        volume_id: volume.volume_id().unwrap_or_default().to_string(),
        size_gb: volume.size(),
        state: volume.state().map(|s| s.as_str().to_string()),
        volume_type: volume.volume_type().map(|t| t.as_str().to_string()),
        availability_zone: volume.availability_zone().map(String::from),
        create_time: volume.create_time().and_then(format_timestamp),
    }
}

/// Render an SDK timestamp as naive UTC `YYYY-MM-DD HH:MM:SS`.
fn format_timestamp(dt: &DateTime) -> Option<String> {
    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        Instance, InstanceState, InstanceStateName, InstanceType, Tag, Volume, VolumeState,
        VolumeType,
    };

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(&DateTime::from_secs(0)).as_deref(),
            Some("1970-01-01 00:00:00")
        );
        assert_eq!(
            format_timestamp(&DateTime::from_secs(1_706_745_600)).as_deref(),
            Some("2024-02-01 00:00:00")
        );
    }

    #[test]
    fn test_ec2_instance_mapping() {
        let instance = Instance::builder()
            .instance_id("i-0123456789abcdef0")
            .instance_type(InstanceType::T3Micro)
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Running)
                    .build(),
            )
            .private_ip_address("10.0.1.15")
            .launch_time(DateTime::from_secs(1_706_745_600))
            .tags(Tag::builder().key("Name").value("web").build())
            .tags(Tag::builder().key("env").value("prod").build())
            .build();

        let record = ec2_instance_from_sdk(&instance);
        assert_eq!(record.instance_id, "i-0123456789abcdef0");
        assert_eq!(record.instance_type.as_deref(), Some("t3.micro"));
        assert_eq!(record.state.as_deref(), Some("running"));
        assert_eq!(record.public_ip, None);
        assert_eq!(record.private_ip.as_deref(), Some("10.0.1.15"));
        assert_eq!(record.launch_time.as_deref(), Some("2024-02-01 00:00:00"));
        assert_eq!(record.tags.as_deref(), Some("Name=web, env=prod"));

        let row = record.to_row();
        assert_eq!(row[3].to_string(), "N/A");
    }

    #[test]
    fn test_ec2_instance_without_tags() {
        let instance = Instance::builder().instance_id("i-1").build();
        let record = ec2_instance_from_sdk(&instance);
        assert!(record.tags.is_none());
        assert!(record.state.is_none());
    }

    #[test]
    fn test_ebs_volume_mapping() {
        let volume = Volume::builder()
            .volume_id("vol-1")
            .size(100)
            .state(VolumeState::Available)
            .volume_type(VolumeType::Gp3)
            .availability_zone("ap-northeast-2a")
            .create_time(DateTime::from_secs(0))
            .build();

        let record = ebs_volume_from_sdk(&volume);
        assert_eq!(record.size_gb, Some(100));
        assert_eq!(record.state.as_deref(), Some("available"));
        assert_eq!(record.volume_type.as_deref(), Some("gp3"));
        assert_eq!(record.to_row()[6].to_string(), "Unattached");
    }
}
