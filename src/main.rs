//! cloudinv - AWS and OCI resource inventory and audit report CLI tool.
//!
//! Collects compute, storage, network, database, and IAM resources and
//! writes Excel, CSV, or JSON reports with best-practice remarks.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, warn};

use cloudinv::aws::client::AwsClients;
use cloudinv::aws::inventory::{self, InventoryOptions};
use cloudinv::aws::types::CostPeriod;
use cloudinv::config::{Args, AwsArgs, AwsCommand, Command, Config, OciArgs, OciCommand};
use cloudinv::error::InventoryError;
use cloudinv::logging;
use cloudinv::oci::cli::OciCli;
use cloudinv::oci::client::OciClient;
use cloudinv::oci::config::{DEFAULT_PROFILE, OciProfile};
use cloudinv::oci::discovery::{self, DiscoverOptions};
use cloudinv::oci::wrapper::{self, ProcessLauncher};
use cloudinv::oci::{collect, iam, orphans, policy, security, vcn};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::from_args(args);

    if let Err(e) = logging::init(config.log_format, &config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("Starting cloudinv");

    if let Err(e) = run(&config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(config: &Config) -> Result<()> {
    match &config.command {
        Command::Aws(aws) => run_aws(config, aws).await,
        Command::Oci(oci) => run_oci(config, oci).await,
    }
}

async fn run_aws(config: &Config, args: &AwsArgs) -> Result<()> {
    let clients = AwsClients::new(args.profile.as_deref(), args.region.as_deref()).await;

    match &args.command {
        AwsCommand::Inventory {
            advanced,
            cost_start,
            cost_end,
        } => {
            let today = chrono::Local::now().date_naive();
            let cost_period = CostPeriod::resolve(*cost_start, *cost_end, today)?;
            let options = InventoryOptions {
                advanced: *advanced,
                cost_period,
            };
            inventory::run_inventory(&clients, &options, &config.output_dir).await?;
        }
        AwsCommand::S3 => {
            inventory::run_s3_list(&clients, &config.output_dir).await?;
        }
    }
    Ok(())
}

async fn run_oci(config: &Config, args: &OciArgs) -> Result<()> {
    // The wrapper only spawns child collectors; it needs no client.
    if let OciCommand::NetworkCollect { base_dir } = &args.command {
        let launcher = ProcessLauncher::current(config.global_args(), args.passthrough_args())?;
        let now = chrono::Local::now().naive_local();
        wrapper::run_network_collection(base_dir, &launcher, now).await?;
        return Ok(());
    }

    let client = oci_client(args)?;
    let output_dir = &config.output_dir;

    match &args.command {
        OciCommand::Orphans => {
            orphans::run_orphans(&client, output_dir).await?;
        }
        OciCommand::Iam => {
            iam::run_iam(&client, output_dir).await?;
        }
        OciCommand::Security => {
            security::run_security(&client, output_dir).await?;
        }
        OciCommand::Vcns => {
            vcn::run_vcns(&client, output_dir).await?;
        }
        OciCommand::Discover(discover) => {
            let options = DiscoverOptions {
                kind: discover.resource_type,
                compartment_name: discover.compartment_name.clone(),
                cloud_guard: discover.cloud_guard,
                upload_bucket: discover.upload_bucket.clone(),
            };
            discovery::run_discovery(&client, &options, output_dir).await?;
        }
        OciCommand::Policies => {
            let today = chrono::Local::now().date_naive();
            policy::run_policies(&client, output_dir, today).await?;
        }
        OciCommand::Collect { kind, dir } => {
            collect::run_collector(&client, *kind, dir).await?;
        }
        OciCommand::NetworkCollect { .. } => {}
    }
    Ok(())
}

/// Build the CLI-backed client. `--tenancy-id` wins over the config file;
/// the region always comes from the profile when it can be read.
fn oci_client(args: &OciArgs) -> Result<OciClient> {
    let profile_name = args.oci_profile.as_deref().unwrap_or(DEFAULT_PROFILE);
    let config_path = args
        .oci_config_file
        .clone()
        .or_else(OciProfile::default_config_path)
        .ok_or_else(|| InventoryError::OciConfig("cannot locate home directory".to_string()))?;

    let (tenancy, region) = match (&args.tenancy_id, OciProfile::load(&config_path, profile_name)) {
        (Some(tenancy), Ok(profile)) => (tenancy.clone(), profile.region),
        (Some(tenancy), Err(e)) => {
            warn!("{}; continuing with --tenancy-id", e);
            (tenancy.clone(), None)
        }
        (None, Ok(profile)) => (profile.tenancy, profile.region),
        (None, Err(e)) => return Err(e.into()),
    };
    debug!(tenancy = %tenancy, region = ?region, "Using OCI tenancy");

    let cli = OciCli::new(&args.oci_bin)
        .with_profile(args.oci_profile.clone())
        .with_config_file(args.oci_config_file.clone());

    Ok(OciClient::new(Box::new(cli), &tenancy, region))
}
