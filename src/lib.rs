//! cloudinv - AWS and OCI resource inventory and audit reports.

pub mod aws;
pub mod checks;
pub mod config;
pub mod error;
pub mod logging;
pub mod oci;
pub mod output;
pub mod report;
