//! CLI configuration and argument parsing.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::logging::LogFormat;
use crate::oci::collect::CollectorKind;
use crate::oci::discovery::ResourceKind;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// AWS and OCI resource inventory and audit report CLI tool.
///
/// Enumerates compute, storage, network, database, and IAM resources and
/// exports them to Excel, CSV, or JSON files for auditing and cost review.
#[derive(Parser, Debug, Clone)]
#[command(name = "cloudinv")]
#[command(about = "AWS and OCI resource inventory and audit report CLI tool")]
#[command(version = const_format::formatcp!(
    "{} (commit: {}, build date: {})",
    VERSION, COMMIT, BUILD_DATE
))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory where report files are written
    #[arg(short, long, global = true, default_value = ".", env = "CLOUDINV_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "CLOUDINV_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (pretty, json)
    #[arg(long, global = true, default_value = "pretty", env = "CLOUDINV_LOG_FORMAT")]
    pub log_format: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect AWS resource inventory
    Aws(AwsArgs),
    /// Collect OCI resource inventory
    Oci(OciArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AwsArgs {
    /// AWS profile to use
    #[arg(short, long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region
    #[arg(short, long, env = "AWS_REGION")]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: AwsCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AwsCommand {
    /// EC2, VPC, EBS, S3, RDS, IAM, and Lambda inventory workbook
    Inventory {
        /// Also collect Route 53, CloudFront, and Cost Explorer data
        #[arg(long, default_value = "false")]
        advanced: bool,

        /// First day of the cost period (YYYY-MM-DD, default: first day of last month)
        #[arg(long, value_parser = parse_date)]
        cost_start: Option<NaiveDate>,

        /// Exclusive end of the cost period (YYYY-MM-DD, default: first day of this month)
        #[arg(long, value_parser = parse_date)]
        cost_end: Option<NaiveDate>,
    },
    /// S3 bucket list workbook
    S3,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OciArgs {
    /// OCI config profile
    #[arg(long, env = "OCI_CLI_PROFILE")]
    pub oci_profile: Option<String>,

    /// OCI config file (default: ~/.oci/config)
    #[arg(long, env = "OCI_CLI_CONFIG_FILE")]
    pub oci_config_file: Option<PathBuf>,

    /// Tenancy OCID (default: read from the OCI config file)
    #[arg(long, env = "OCI_TENANCY_ID")]
    pub tenancy_id: Option<String>,

    /// OCI CLI executable
    #[arg(long, default_value = "oci", env = "OCI_CLI_BIN")]
    pub oci_bin: String,

    #[command(subcommand)]
    pub command: OciCommand,
}

impl OciArgs {
    /// OCI flags to forward to a child `cloudinv oci` invocation.
    pub fn passthrough_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(profile) = &self.oci_profile {
            args.extend(["--oci-profile".to_string(), profile.clone()]);
        }
        if let Some(path) = &self.oci_config_file {
            args.extend(["--oci-config-file".to_string(), path.display().to_string()]);
        }
        if let Some(tenancy) = &self.tenancy_id {
            args.extend(["--tenancy-id".to_string(), tenancy.clone()]);
        }
        args.extend(["--oci-bin".to_string(), self.oci_bin.clone()]);
        args
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum OciCommand {
    /// Unused and orphaned resources workbook
    Orphans,
    /// IAM users, group memberships, and policies workbook
    Iam,
    /// Security list and NSG rules CSV
    Security,
    /// VCN list JSON across compartments
    Vcns,
    /// Resource discovery with best-practice findings
    Discover(DiscoverArgs),
    /// Tenancy policy statements CSV and workbook
    Policies,
    /// Dump raw CLI JSON for one resource type across regions and compartments
    Collect {
        /// Resource type to collect
        #[arg(value_enum)]
        kind: CollectorKind,

        /// Directory for the JSON files
        dir: PathBuf,
    },
    /// Run every network collector sequentially into a timestamped directory
    NetworkCollect {
        /// Parent directory of the collection directory
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DiscoverArgs {
    /// Only discover one resource type
    #[arg(long = "type", value_enum)]
    pub resource_type: Option<ResourceKind>,

    /// Only scan the compartment with this name
    #[arg(long)]
    pub compartment_name: Option<String>,

    /// Include Cloud Advisor, Cloud Guard, and per-instance image/NSG checks
    #[arg(long, default_value = "false")]
    pub cloud_guard: bool,

    /// Upload oci_resources.json to this Object Storage bucket
    #[arg(long)]
    pub upload_bucket: Option<String>,
}

/// Application configuration derived from CLI args.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    pub command: Command,
}

impl Config {
    /// Create config from CLI arguments.
    pub fn from_args(args: Args) -> Self {
        Self {
            output_dir: args.output_dir,
            log_level: args.log_level,
            log_format: LogFormat::parse(&args.log_format),
            command: args.command,
        }
    }

    /// Logging flags to forward to child processes.
    pub fn global_args(&self) -> Vec<String> {
        let format = match self.log_format {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        };
        vec![
            "--log-level".to_string(),
            self.log_level.clone(),
            "--log-format".to_string(),
            format.to_string(),
        ]
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}
