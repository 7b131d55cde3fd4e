//! Row records for the AWS inventory sheets.

use chrono::{Datelike, NaiveDate};

use crate::checks;
use crate::error::InventoryError;
use crate::report::{Cell, NA, ToRow};

#[derive(Debug, Clone, Default)]
pub struct Ec2Instance {
    pub instance_id: String,
    pub instance_type: Option<String>,
    pub state: Option<String>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub launch_time: Option<String>,
    pub tags: Option<String>,
}

impl ToRow for Ec2Instance {
    const HEADERS: &'static [&'static str] = &[
        "Instance ID",
        "Type",
        "State",
        "Public IP",
        "Private IP",
        "Launch Time",
        "Tags",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.instance_id),
            Cell::opt(self.instance_type.clone()),
            Cell::opt(self.state.clone()),
            Cell::opt(self.public_ip.clone()),
            Cell::opt(self.private_ip.clone()),
            Cell::opt(self.launch_time.clone()),
            Cell::opt(self.tags.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vpc {
    pub vpc_id: String,
    pub cidr_block: Option<String>,
    pub is_default: Option<bool>,
}

impl ToRow for Vpc {
    const HEADERS: &'static [&'static str] = &["VPC ID", "CIDR Block", "Is Default"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.vpc_id),
            Cell::opt(self.cidr_block.clone()),
            self.is_default.map(Cell::Bool).unwrap_or_else(|| Cell::from(NA)),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct EbsVolume {
    pub volume_id: String,
    pub size_gb: Option<i32>,
    pub state: Option<String>,
    pub volume_type: Option<String>,
    pub availability_zone: Option<String>,
    pub create_time: Option<String>,
}

impl ToRow for EbsVolume {
    const HEADERS: &'static [&'static str] = &[
        "Volume ID",
        "Size (GB)",
        "State",
        "Type",
        "Availability Zone",
        "Created Time",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.volume_id),
            Cell::opt_int(self.size_gb),
            Cell::opt(self.state.clone()),
            Cell::opt(self.volume_type.clone()),
            Cell::opt(self.availability_zone.clone()),
            Cell::opt(self.create_time.clone()),
            Cell::from(checks::ebs_volume_remark(self.state.as_deref())),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct S3Bucket {
    pub name: String,
    pub creation_date: Option<String>,
}

impl ToRow for S3Bucket {
    const HEADERS: &'static [&'static str] = &["Bucket Name", "Creation Date"];

    fn to_row(&self) -> Vec<Cell> {
        vec![Cell::from(&self.name), Cell::opt(self.creation_date.clone())]
    }
}

#[derive(Debug, Clone, Default)]
pub struct RdsInstance {
    pub identifier: String,
    pub class: Option<String>,
    pub engine: Option<String>,
    pub status: Option<String>,
    pub endpoint: Option<String>,
    pub publicly_accessible: Option<bool>,
}

impl ToRow for RdsInstance {
    const HEADERS: &'static [&'static str] = &[
        "DB Identifier",
        "DB Class",
        "Engine",
        "Status",
        "Endpoint",
        "Remarks",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.identifier),
            Cell::opt(self.class.clone()),
            Cell::opt(self.engine.clone()),
            Cell::opt(self.status.clone()),
            Cell::opt(self.endpoint.clone()),
            Cell::from(checks::rds_access_remark(self.publicly_accessible)),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct IamUser {
    pub user_name: String,
    pub arn: String,
    pub create_date: Option<String>,
}

impl ToRow for IamUser {
    const HEADERS: &'static [&'static str] = &["User Name", "User ARN", "Creation Date"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.user_name),
            Cell::from(&self.arn),
            Cell::opt(self.create_date.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct IamRole {
    pub role_name: String,
    pub arn: String,
    pub create_date: Option<String>,
}

impl ToRow for IamRole {
    const HEADERS: &'static [&'static str] = &["Role Name", "Role ARN", "Creation Date"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.role_name),
            Cell::from(&self.arn),
            Cell::opt(self.create_date.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct LambdaFunction {
    pub name: String,
    pub runtime: Option<String>,
    pub handler: Option<String>,
    pub memory_size: Option<i32>,
    pub timeout: Option<i32>,
}

impl ToRow for LambdaFunction {
    const HEADERS: &'static [&'static str] = &[
        "Function Name",
        "Runtime",
        "Handler",
        "Memory Size",
        "Timeout",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.name),
            Cell::opt(self.runtime.clone()),
            Cell::opt(self.handler.clone()),
            Cell::opt_int(self.memory_size),
            Cell::opt_int(self.timeout),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
    pub record_count: Option<i64>,
}

impl ToRow for HostedZone {
    const HEADERS: &'static [&'static str] = &["Zone ID", "Domain Name", "Record Count"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.id),
            Cell::from(&self.name),
            Cell::opt_int(self.record_count),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Distribution {
    pub id: String,
    pub domain_name: String,
    pub status: String,
}

impl ToRow for Distribution {
    const HEADERS: &'static [&'static str] = &["Distribution ID", "Domain Name", "Status"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.id),
            Cell::from(&self.domain_name),
            Cell::from(&self.status),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct CostEntry {
    pub billing_month: String,
    pub amount: Option<String>,
    pub unit: Option<String>,
}

impl ToRow for CostEntry {
    const HEADERS: &'static [&'static str] = &["Billing Month", "Cost", "Currency"];

    fn to_row(&self) -> Vec<Cell> {
        let amount = match self.amount.as_deref().map(str::parse::<f64>) {
            Some(Ok(value)) => Cell::Float(value),
            _ => Cell::opt(self.amount.clone()),
        };
        vec![
            Cell::from(&self.billing_month),
            amount,
            Cell::opt(self.unit.clone()),
        ]
    }
}

/// Cost Explorer query window; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CostPeriod {
    /// Resolve the period, defaulting to the calendar month before `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, InventoryError> {
        let this_month = today.with_day(1).unwrap_or(today);
        let last_month = this_month
            .pred_opt()
            .and_then(|d| d.with_day(1))
            .unwrap_or(this_month);

        let period = Self {
            start: start.unwrap_or(last_month),
            end: end.unwrap_or(this_month),
        };

        if period.start >= period.end {
            return Err(InventoryError::InvalidCostPeriod {
                start: period.start,
                end: period.end,
            });
        }
        Ok(period)
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_width<T: ToRow>(record: &T) {
        assert_eq!(record.to_row().len(), T::HEADERS.len());
    }

    #[test]
    fn test_row_widths_match_headers() {
        assert_width(&Ec2Instance::default());
        assert_width(&Vpc::default());
        assert_width(&EbsVolume::default());
        assert_width(&S3Bucket::default());
        assert_width(&RdsInstance::default());
        assert_width(&IamUser::default());
        assert_width(&IamRole::default());
        assert_width(&LambdaFunction::default());
        assert_width(&HostedZone::default());
        assert_width(&Distribution::default());
        assert_width(&CostEntry::default());
    }

    #[test]
    fn test_missing_optional_fields_are_na() {
        let row = Ec2Instance {
            instance_id: "i-0abc".to_string(),
            ..Default::default()
        }
        .to_row();
        assert_eq!(row[0], Cell::from("i-0abc"));
        assert!(row[1..].iter().all(|c| c.to_string() == "N/A"));
    }

    #[test]
    fn test_ebs_remarks_follow_state() {
        let unattached = EbsVolume {
            volume_id: "vol-1".into(),
            state: Some("available".into()),
            ..Default::default()
        };
        let attached = EbsVolume {
            volume_id: "vol-2".into(),
            state: Some("in-use".into()),
            ..Default::default()
        };
        assert_eq!(unattached.to_row()[6], Cell::from("Unattached"));
        assert_eq!(attached.to_row()[6], Cell::from("In Use"));
    }

    #[test]
    fn test_rds_public_remark() {
        let db = RdsInstance {
            identifier: "orders".into(),
            publicly_accessible: Some(true),
            ..Default::default()
        };
        assert_eq!(db.to_row()[5], Cell::from("Publicly accessible (Risky)"));
    }

    #[test]
    fn test_cost_amount_parsed_as_number() {
        let entry = CostEntry {
            billing_month: "2024-02-01".into(),
            amount: Some("123.45".into()),
            unit: Some("USD".into()),
        };
        assert_eq!(entry.to_row()[1], Cell::Float(123.45));

        let odd = CostEntry {
            amount: Some("n/a".into()),
            ..entry
        };
        assert_eq!(odd.to_row()[1], Cell::from("n/a"));
    }

    #[test]
    fn test_cost_period_defaults_to_previous_month() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let period = CostPeriod::resolve(None, None, today).unwrap();
        assert_eq!(period.start_str(), "2024-02-01");
        assert_eq!(period.end_str(), "2024-03-01");
    }

    #[test]
    fn test_cost_period_crosses_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let period = CostPeriod::resolve(None, None, today).unwrap();
        assert_eq!(period.start_str(), "2024-12-01");
        assert_eq!(period.end_str(), "2025-01-01");
    }

    #[test]
    fn test_cost_period_rejects_inverted_range() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1);
        let end = NaiveDate::from_ymd_opt(2024, 2, 1);
        let err = CostPeriod::resolve(start, end, today).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InvalidCostPeriod { start: s, end: e }
                if s == start.unwrap() && e == end.unwrap()
        ));

        let same = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert!(matches!(
            CostPeriod::resolve(same, same, today),
            Err(InventoryError::InvalidCostPeriod { .. })
        ));
    }
}
