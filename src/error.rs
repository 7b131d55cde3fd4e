//! Custom error types for cloudinv.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while collecting or exporting inventory.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("[{0}] {1}")]
    AwsSdk(String, String),

    #[error("[{0}] AWS credentials error: {1}")]
    AwsCredentials(String, String),

    #[error("[{0}] AWS region not configured: {1}")]
    AwsRegion(String, String),

    #[error("OCI CLI command failed: {command}: {details}")]
    OciCli { command: String, details: String },

    #[error("OCI CLI returned unexpected output for {command}: {details}")]
    OciOutput { command: String, details: String },

    #[error("OCI config error: {0}")]
    OciConfig(String),

    #[error("No subscribed regions found")]
    NoRegions,

    #[error("No compartments found")]
    NoCompartments,

    #[error("Invalid cost period: start {start} must be before end {end}")]
    InvalidCostPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Table '{table}' expects {expected} columns, got {actual}")]
    ColumnMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
}

impl InventoryError {
    /// Create an AWS SDK error from any error type.
    /// Analyzes the error message to provide more specific error types.
    pub fn aws<E: std::fmt::Debug + std::fmt::Display>(component: &str, err: E) -> Self {
        let err_debug = format!("{:?}", err);
        let err_display = err.to_string();
        let component = component.to_string();

        let combined_lower = format!("{} {}", err_display, err_debug).to_lowercase();

        const CREDENTIAL_HINTS: &[&str] = &[
            "no credentials",
            "credentials not found",
            "invalid credentials",
            "expired token",
            "expiredtoken",
            "the security token included in the request is invalid",
            "the security token included in the request is expired",
            "unrecognized client",
            "invalidclienttokenid",
            "signaturedoesnotmatch",
            "access denied",
            "not authorized",
            "accessdenied",
        ];

        if CREDENTIAL_HINTS.iter().any(|h| combined_lower.contains(h)) {
            return InventoryError::AwsCredentials(
                component,
                Self::extract_error_details(&err_debug, &err_display),
            );
        }

        if combined_lower.contains("no region")
            || combined_lower.contains("region not found")
            || combined_lower.contains("missing region")
        {
            return InventoryError::AwsRegion(
                component,
                Self::extract_error_details(&err_debug, &err_display),
            );
        }

        InventoryError::AwsSdk(
            component,
            Self::extract_error_details(&err_debug, &err_display),
        )
    }

    /// Extract a single-line message from an AWS SDK error.
    fn extract_error_details(debug_str: &str, display_str: &str) -> String {
        // SDK service errors carry `message: Some("...")` in their Debug output
        if let Some(pos) = debug_str.find("message: Some(\"") {
            let start = pos + "message: Some(\"".len();
            let rest = &debug_str[start..];
            if let Some(end) = rest.find('"') {
                return rest[..end].to_string();
            }
        }

        if !display_str.to_lowercase().contains("service error") {
            return display_str.to_string();
        }

        "AWS API request failed".to_string()
    }

    /// Whether this is an OCI service-side failure that a report may skip.
    pub fn is_oci_service_error(&self) -> bool {
        matches!(
            self,
            InventoryError::OciCli { .. } | InventoryError::OciOutput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_column_mismatch() {
        let err = InventoryError::ColumnMismatch {
            table: "VPCs".to_string(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Table 'VPCs' expects 3 columns, got 2");
    }

    #[test]
    fn test_error_display_oci_cli() {
        let err = InventoryError::OciCli {
            command: "oci network vcn list".to_string(),
            details: "NotAuthorizedOrNotFound".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OCI CLI command failed: oci network vcn list: NotAuthorizedOrNotFound"
        );
        assert!(err.is_oci_service_error());
    }

    #[test]
    fn test_error_aws_helper_generic() {
        let err = InventoryError::aws("aws::inventory", "connection failed");
        assert!(matches!(err, InventoryError::AwsSdk(_, _)));
        assert!(err.to_string().contains("[aws::inventory]"));
        assert!(err.to_string().contains("connection failed"));
    }

    #[test]
    fn test_error_aws_credentials_expired() {
        let err = InventoryError::aws(
            "aws::inventory",
            "The security token included in the request is expired",
        );
        assert!(matches!(err, InventoryError::AwsCredentials(_, _)));
        assert!(err.to_string().contains("AWS credentials error"));
    }

    #[test]
    fn test_error_aws_region_missing() {
        let err = InventoryError::aws("aws::client", "No region was found");
        assert!(matches!(err, InventoryError::AwsRegion(_, _)));
        assert!(err.to_string().contains("AWS region not configured"));
    }

    #[test]
    fn test_extract_error_details_prefers_message_field() {
        let debug = r#"ServiceError { message: Some("User is not authorized"), code: None }"#;
        let details = InventoryError::extract_error_details(debug, "service error");
        assert_eq!(details, "User is not authorized");
    }

    #[test]
    fn test_extract_error_details_generic_service_error() {
        let details = InventoryError::extract_error_details("Opaque", "service error");
        assert_eq!(details, "AWS API request failed");
    }

    #[test]
    fn test_non_oci_errors_are_not_service_errors() {
        assert!(!InventoryError::NoRegions.is_oci_service_error());
        assert!(!InventoryError::OciConfig("missing tenancy".into()).is_oci_service_error());
    }

    #[test]
    fn test_invalid_cost_period_message() {
        let err = InventoryError::InvalidCostPeriod {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid cost period: start 2024-03-01 must be before end 2024-02-01"
        );
        assert!(!err.is_oci_service_error());
    }
}
