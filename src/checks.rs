//! Best-practice predicates applied while rows are collected.
//!
//! Each check looks at fields of a single resource; none depend on another.

use std::collections::HashMap;

/// CIDR that matches every IPv4 address.
pub const OPEN_CIDR: &str = "0.0.0.0/0";

pub const REMARK_RISKY: &str = "Open to all (Risky)";
pub const REMARK_SAFE: &str = "Safe";

/// Remark for a security rule given its source or destination CIDR.
pub fn rule_remark(cidr: Option<&str>) -> &'static str {
    if is_open_cidr(cidr) {
        REMARK_RISKY
    } else {
        REMARK_SAFE
    }
}

pub fn is_open_cidr(cidr: Option<&str>) -> bool {
    cidr == Some(OPEN_CIDR)
}

// ---------------------------------------------------------------------------
// Orphan and usage remarks
// ---------------------------------------------------------------------------

pub fn is_orphaned_instance(state: &str) -> bool {
    matches!(state, "TERMINATED" | "STOPPED")
}

pub fn is_orphaned_load_balancer(state: &str) -> bool {
    matches!(state, "TERMINATED" | "FAILED")
}

pub fn is_unattached_vnic(state: &str) -> bool {
    state != "ATTACHED"
}

/// DRGs and IPSec connections are inactive outside `AVAILABLE`.
pub fn is_inactive_gateway(state: &str) -> bool {
    state != "AVAILABLE"
}

pub fn bucket_usage_remark(approximate_count: Option<i64>) -> &'static str {
    if approximate_count == Some(0) {
        "Unused"
    } else {
        "Active"
    }
}

pub fn file_system_remark(state: &str) -> &'static str {
    if state == "AVAILABLE" {
        "Unused"
    } else {
        "In Use"
    }
}

pub fn public_ip_remark(assigned_entity_id: Option<&str>) -> &'static str {
    match assigned_entity_id {
        Some(id) if !id.is_empty() => "In Use",
        _ => "Unused",
    }
}

pub fn iam_user_remark(state: &str) -> &'static str {
    if state == "ACTIVE" {
        "Active"
    } else {
        "Inactive/Disabled"
    }
}

pub fn ebs_volume_remark(state: Option<&str>) -> &'static str {
    if state == Some("available") {
        "Unattached"
    } else {
        "In Use"
    }
}

pub fn rds_access_remark(publicly_accessible: Option<bool>) -> &'static str {
    if publicly_accessible == Some(true) {
        "Publicly accessible (Risky)"
    } else {
        "Private"
    }
}

// ---------------------------------------------------------------------------
// Discovery findings
// ---------------------------------------------------------------------------

pub fn vcn_has_open_cidr(cidr_block: Option<&str>) -> bool {
    is_open_cidr(cidr_block)
}

pub fn is_basic_shape(shape: &str) -> bool {
    shape.starts_with("VM.Standard")
}

pub fn has_ssh_keys(metadata: Option<&HashMap<String, String>>) -> bool {
    metadata.is_some_and(|m| m.contains_key("ssh_authorized_keys"))
}

/// Password login counts as enabled when metadata exists without the opt-out key.
pub fn password_login_enabled(metadata: Option<&HashMap<String, String>>) -> bool {
    metadata.is_some_and(|m| !m.contains_key("disable_password_auth"))
}

pub fn logging_agent_configured(metadata: Option<&HashMap<String, String>>) -> bool {
    metadata
        .and_then(|m| m.get("logging_agent"))
        .is_some_and(|v| v == "configured")
}

/// Platform images live outside any compartment. One is outdated when a newer
/// image exists for the same operating system and version.
pub fn is_outdated_platform_image(
    image_compartment_id: Option<&str>,
    image_id: &str,
    newest_image_id: Option<&str>,
) -> bool {
    image_compartment_id.is_none() && newest_image_id.is_some_and(|newest| newest != image_id)
}

pub fn is_unrestricted_ingress(direction: &str, source: Option<&str>) -> bool {
    direction == "INGRESS" && is_open_cidr(source)
}

pub fn allows_public_access(public_access_type: Option<&str>) -> bool {
    public_access_type != Some("NoPublicAccess")
}

pub fn is_non_oltp_workload(db_workload: Option<&str>) -> bool {
    db_workload != Some("OLTP")
}

pub fn is_flexible_lb_shape(shape_name: &str) -> bool {
    shape_name.starts_with("flexible")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_rule_remark_open_cidr_is_risky() {
        assert_eq!(rule_remark(Some("0.0.0.0/0")), "Open to all (Risky)");
    }

    #[test]
    fn test_rule_remark_other_cidrs_are_safe() {
        assert_eq!(rule_remark(Some("10.0.0.0/16")), "Safe");
        assert_eq!(rule_remark(Some("0.0.0.0/1")), "Safe");
        assert_eq!(rule_remark(None), "Safe");
    }

    #[test]
    fn test_orphan_states() {
        assert!(is_orphaned_instance("TERMINATED"));
        assert!(is_orphaned_instance("STOPPED"));
        assert!(!is_orphaned_instance("RUNNING"));
        assert!(is_orphaned_load_balancer("FAILED"));
        assert!(!is_orphaned_load_balancer("ACTIVE"));
        assert!(is_unattached_vnic("DETACHED"));
        assert!(!is_unattached_vnic("ATTACHED"));
        assert!(is_inactive_gateway("PROVISIONING"));
        assert!(!is_inactive_gateway("AVAILABLE"));
    }

    #[test]
    fn test_usage_remarks() {
        assert_eq!(bucket_usage_remark(Some(0)), "Unused");
        assert_eq!(bucket_usage_remark(Some(12)), "Active");
        assert_eq!(bucket_usage_remark(None), "Active");
        assert_eq!(file_system_remark("AVAILABLE"), "Unused");
        assert_eq!(file_system_remark("CREATING"), "In Use");
        assert_eq!(public_ip_remark(None), "Unused");
        assert_eq!(public_ip_remark(Some("")), "Unused");
        assert_eq!(public_ip_remark(Some("ocid1.privateip.oc1..x")), "In Use");
    }

    #[test]
    fn test_iam_and_aws_remarks() {
        assert_eq!(iam_user_remark("ACTIVE"), "Active");
        assert_eq!(iam_user_remark("BLOCKED"), "Inactive/Disabled");
        assert_eq!(ebs_volume_remark(Some("available")), "Unattached");
        assert_eq!(ebs_volume_remark(Some("in-use")), "In Use");
        assert_eq!(rds_access_remark(Some(true)), "Publicly accessible (Risky)");
        assert_eq!(rds_access_remark(None), "Private");
    }

    #[test]
    fn test_instance_metadata_checks() {
        let full = metadata(&[
            ("ssh_authorized_keys", "ssh-rsa AAAA"),
            ("disable_password_auth", "true"),
            ("logging_agent", "configured"),
        ]);
        assert!(has_ssh_keys(Some(&full)));
        assert!(!password_login_enabled(Some(&full)));
        assert!(logging_agent_configured(Some(&full)));

        let bare = metadata(&[("user_data", "abc")]);
        assert!(!has_ssh_keys(Some(&bare)));
        assert!(password_login_enabled(Some(&bare)));
        assert!(!logging_agent_configured(Some(&bare)));

        assert!(!has_ssh_keys(None));
        assert!(!password_login_enabled(None));
        assert!(!logging_agent_configured(None));
    }

    #[test]
    fn test_discovery_predicates() {
        assert!(vcn_has_open_cidr(Some("0.0.0.0/0")));
        assert!(!vcn_has_open_cidr(Some("10.0.0.0/16")));
        assert!(is_basic_shape("VM.Standard2.1"));
        assert!(!is_basic_shape("VM.Optimized3.Flex"));
        assert!(is_outdated_platform_image(None, "img-old", Some("img-new")));
        assert!(!is_outdated_platform_image(None, "img-new", Some("img-new")));
        assert!(!is_outdated_platform_image(None, "img-old", None));
        assert!(!is_outdated_platform_image(
            Some("ocid1.compartment.oc1..custom"),
            "img-old",
            Some("img-new")
        ));
        assert!(is_unrestricted_ingress("INGRESS", Some("0.0.0.0/0")));
        assert!(!is_unrestricted_ingress("EGRESS", Some("0.0.0.0/0")));
        assert!(allows_public_access(Some("ObjectRead")));
        assert!(!allows_public_access(Some("NoPublicAccess")));
        assert!(is_non_oltp_workload(Some("DW")));
        assert!(!is_non_oltp_workload(Some("OLTP")));
        assert!(is_flexible_lb_shape("flexible"));
        assert!(!is_flexible_lb_shape("100Mbps"));
    }
}
