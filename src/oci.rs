//! OCI inventory, audit, and raw collection commands.
//!
//! Every call goes through the `oci` CLI; see [`cli::CliRunner`].

pub mod cli;
pub mod client;
pub mod collect;
pub mod config;
pub mod discovery;
pub mod iam;
pub mod orphans;
pub mod policy;
pub mod security;
pub mod types;
pub mod vcn;
pub mod wrapper;
