//! Sequential run of every network collector into one timestamped directory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::process::Command;
use tracing::{error, info};

use super::collect::CollectorKind;

pub const WRAPPER_LOG: &str = "wrapper_log.txt";

/// One collector with its output directory and log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStep {
    pub kind: CollectorKind,
    pub dir_name: &'static str,
    pub log_name: &'static str,
}

pub const NETWORK_STEPS: &[CollectionStep] = &[
    CollectionStep {
        kind: CollectorKind::Subnet,
        dir_name: "subnet_details",
        log_name: "subnet_log.txt",
    },
    CollectionStep {
        kind: CollectorKind::LogGroup,
        dir_name: "flowlog_details",
        log_name: "flowlog_log.txt",
    },
    CollectionStep {
        kind: CollectorKind::Vcn,
        dir_name: "vcn_details",
        log_name: "vcn_log.txt",
    },
    CollectionStep {
        kind: CollectorKind::RouteTable,
        dir_name: "route_table_details",
        log_name: "route_table_log.txt",
    },
    CollectionStep {
        kind: CollectorKind::Lpg,
        dir_name: "lpg_data",
        log_name: "lpg_log.txt",
    },
    CollectionStep {
        kind: CollectorKind::Nsg,
        dir_name: "nsg_data",
        log_name: "nsg_log.txt",
    },
    CollectionStep {
        kind: CollectorKind::SecurityList,
        dir_name: "security_list_data",
        log_name: "security_list_log.txt",
    },
];

/// Runs a single collector with its output redirected to `log`.
#[async_trait]
pub trait StepLauncher: Send + Sync {
    async fn launch(&self, kind: CollectorKind, out_dir: &Path, log: File) -> Result<()>;
}

/// Launches `<exe> <global args> oci <oci args> collect <kind> <dir>` as a
/// child process.
pub struct ProcessLauncher {
    exe: PathBuf,
    global_args: Vec<String>,
    oci_args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(exe: PathBuf, global_args: Vec<String>, oci_args: Vec<String>) -> Self {
        Self {
            exe,
            global_args,
            oci_args,
        }
    }

    /// Use the running executable.
    pub fn current(global_args: Vec<String>, oci_args: Vec<String>) -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate current executable")?;
        Ok(Self::new(exe, global_args, oci_args))
    }

    fn args(&self, kind: CollectorKind, out_dir: &Path) -> Vec<String> {
        let mut args = self.global_args.clone();
        args.push("oci".to_string());
        args.extend(self.oci_args.iter().cloned());
        args.push("collect".to_string());
        args.push(kind.as_arg().to_string());
        args.push(out_dir.display().to_string());
        args
    }
}

#[async_trait]
impl StepLauncher for ProcessLauncher {
    async fn launch(&self, kind: CollectorKind, out_dir: &Path, log: File) -> Result<()> {
        let stderr = log.try_clone().context("Failed to duplicate log handle")?;
        let status = Command::new(&self.exe)
            .args(self.args(kind, out_dir))
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .status()
            .await
            .with_context(|| format!("Failed to start {}", self.exe.display()))?;

        if !status.success() {
            anyhow::bail!("{} collector exited with {}", kind.as_arg(), status);
        }
        Ok(())
    }
}

/// `NetworkDataCollection_<YYYYmmdd_HHMMSS>`
pub fn collection_dir_name(now: NaiveDateTime) -> String {
    format!("NetworkDataCollection_{}", now.format("%Y%m%d_%H%M%S"))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writeln!(file, "{}", line).with_context(|| format!("Failed to write {}", path.display()))
}

/// Run every step in order. A failing step is logged and the next one runs.
pub async fn run_network_collection(
    base_dir: &Path,
    launcher: &dyn StepLauncher,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let root = base_dir.join(collection_dir_name(now));
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create {}", root.display()))?;

    let wrapper_log = root.join(WRAPPER_LOG);
    append_line(
        &wrapper_log,
        &format!("Network data collection started at {}", now.format("%Y-%m-%d %H:%M:%S")),
    )?;
    println!("Collecting network data into {}", root.display());

    for step in NETWORK_STEPS {
        let out_dir = root.join(step.dir_name);
        let log_path = out_dir.join(step.log_name);
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
        let log = File::create(&log_path)
            .with_context(|| format!("Failed to create {}", log_path.display()))?;

        info!(kind = step.kind.as_arg(), dir = %out_dir.display(), "Running collector");
        println!("Running {} collector...", step.kind.as_arg());

        match launcher.launch(step.kind, &out_dir, log).await {
            Ok(()) => {
                append_line(&wrapper_log, &format!("{} collector completed", step.kind.as_arg()))?;
            }
            Err(e) => {
                error!(kind = step.kind.as_arg(), "Collector failed: {:#}", e);
                let line = format!("Error running {} collector: {:#}", step.kind.as_arg(), e);
                append_line(&log_path, &line)?;
                append_line(&wrapper_log, &line)?;
            }
        }
    }

    append_line(&wrapper_log, "All data collection scripts have been executed.")?;
    println!(
        "All data collection completed. Data saved in: {}",
        root.display()
    );
    Ok(root)
}
