//! AWS SDK client wrappers.

use tracing::debug;

/// Service clients sharing one loaded AWS configuration.
#[derive(Clone)]
pub struct AwsClients {
    pub ec2: aws_sdk_ec2::Client,
    pub s3: aws_sdk_s3::Client,
    pub rds: aws_sdk_rds::Client,
    pub iam: aws_sdk_iam::Client,
    pub lambda: aws_sdk_lambda::Client,
    pub route53: aws_sdk_route53::Client,
    pub cloudfront: aws_sdk_cloudfront::Client,
    pub cost_explorer: aws_sdk_costexplorer::Client,
    region: String,
}

impl AwsClients {
    /// Create clients from the default credential chain, optionally pinned
    /// to a profile and region.
    pub async fn new(profile: Option<&str>, region: Option<&str>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(profile) = profile {
            debug!("Using AWS profile: {}", profile);
            config_loader = config_loader.profile_name(profile);
        }

        if let Some(region) = region {
            debug!("Using AWS region: {}", region);
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            ec2: aws_sdk_ec2::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
            rds: aws_sdk_rds::Client::new(&config),
            iam: aws_sdk_iam::Client::new(&config),
            lambda: aws_sdk_lambda::Client::new(&config),
            route53: aws_sdk_route53::Client::new(&config),
            cloudfront: aws_sdk_cloudfront::Client::new(&config),
            cost_explorer: aws_sdk_costexplorer::Client::new(&config),
            region,
        }
    }

    /// Get the AWS region string.
    pub fn region(&self) -> &str {
        &self.region
    }
}
