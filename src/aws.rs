//! AWS inventory module.

pub mod client;
pub mod inventory;
pub mod types;
