//! Remote provisioning API seams
//!
//! Narrow traits over the remote calls the lifecycle controllers issue.
//! Production code uses the AWS-backed implementations in [`aws`]; tests
//! substitute recording fakes.

pub mod aws;

use crate::config::ContainerDefinition;
use crate::error::Result;
use crate::template::RenderedTemplate;
use async_trait::async_trait;

/// Summary of one provisioned infrastructure stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSummary {
    /// Stack name
    pub name: String,
    /// Stack status (CREATE_COMPLETE, DELETE_IN_PROGRESS, ...)
    pub status: String,
    /// Creation time in seconds since the Unix epoch
    pub creation_time: i64,
    /// Template description
    pub description: String,
}

/// Description of one deployed service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    /// Service name
    pub name: String,
    /// Service status (ACTIVE, DRAINING, ...)
    pub status: String,
    /// Tasks currently running
    pub running_count: i32,
    /// Tasks the service tries to keep running
    pub desired_count: i32,
}

/// Load balancer binding for a new service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerBinding {
    /// Target group the load balancer routes to
    pub target_group_arn: String,
    /// Container receiving the traffic
    pub container_name: String,
    /// Port the container listens on
    pub container_port: i32,
}

/// Infrastructure stack provisioning
#[async_trait]
pub trait StackApi {
    /// Submit a new stack tagged with its name
    async fn create_stack(&self, name: &str, template: &RenderedTemplate) -> Result<()>;

    /// Tear down a stack
    async fn delete_stack(&self, name: &str) -> Result<()>;

    /// List stacks matching the given status filter (empty filter = all)
    async fn list_stacks(&self, status_filter: &[&str]) -> Result<Vec<StackSummary>>;
}

/// Container scheduler operations
#[async_trait]
pub trait SchedulerApi {
    /// Register a cluster identity
    async fn create_cluster(&self, name: &str) -> Result<()>;

    /// Remove a cluster identity
    async fn delete_cluster(&self, name: &str) -> Result<()>;

    /// Register a task definition holding a single container
    async fn register_task_definition(
        &self,
        family: &str,
        container: &ContainerDefinition,
    ) -> Result<()>;

    /// Create a service bound to a load balancer target group
    async fn create_service(
        &self,
        cluster: &str,
        service_name: &str,
        task_definition: &str,
        load_balancer: LoadBalancerBinding,
        desired_count: i32,
    ) -> Result<()>;

    /// Change how many task copies a service keeps running
    async fn update_service_desired_count(
        &self,
        cluster: &str,
        service_name: &str,
        desired_count: i32,
    ) -> Result<()>;

    /// Delete a service
    async fn delete_service(&self, cluster: &str, service_name: &str) -> Result<()>;

    /// Describe every service deployed to a cluster
    async fn describe_services(&self, cluster: &str) -> Result<Vec<ServiceDescription>>;
}

/// Load balancer routing lookups
#[async_trait]
pub trait RoutingApi {
    /// Resolve a target group name to its ARN
    async fn target_group_arn(&self, name: &str) -> Result<String>;
}
