//! Error types for Cloudcrane

use thiserror::Error;

/// Result type for Cloudcrane operations
pub type Result<T> = std::result::Result<T, CraneError>;

/// Cloudcrane error types
#[derive(Error, Debug)]
pub enum CraneError {
    #[error("Unknown service: [{0}]")]
    ServiceNotFound(String),

    #[error("Target group not found: {0}")]
    TargetGroupNotFound(String),

    #[error("Deployment descriptor error: {0}")]
    DeploymentParse(String),

    #[error("CloudFormation error: {0}")]
    CloudFormation(#[from] aws_sdk_cloudformation::Error),

    #[error("ECS error: {0}")]
    Ecs(#[from] aws_sdk_ecs::Error),

    #[error("Load balancer error: {0}")]
    LoadBalancer(#[from] aws_sdk_elasticloadbalancingv2::Error),

    #[error("Invalid request: {0}")]
    Build(#[from] aws_smithy_types::error::operation::BuildError),
}
