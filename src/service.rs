//! Service lifecycle management
//!
//! A deployment registers a task definition and creates a service bound
//! to the target group `{cluster}-{loadBalancer}-tg`, which the cluster
//! stack provisioned earlier. Removal drains the service to zero running
//! tasks before deleting it.

use crate::cloud::{LoadBalancerBinding, RoutingApi, SchedulerApi, ServiceDescription};
use crate::config::DeploymentConfig;
use crate::error::{CraneError, Result};
use std::time::Duration;

/// Interval between drain-poll rounds while a service winds down
const DRAIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Service lifecycle orchestration over the provisioning seams
pub struct ServiceController<C, R> {
    scheduler: C,
    routing: R,
}

impl<C: SchedulerApi, R: RoutingApi> ServiceController<C, R> {
    pub fn new(scheduler: C, routing: R) -> Self {
        Self { scheduler, routing }
    }

    /// Register the task definition and create the service behind the
    /// cluster's target group.
    pub async fn deploy(
        &self,
        cluster: &str,
        service_name: &str,
        config: &DeploymentConfig,
    ) -> Result<()> {
        self.scheduler
            .register_task_definition(service_name, &config.container_definition)
            .await?;

        let target_group = format!("{}-{}-tg", cluster, config.load_balancer);
        let target_group_arn = self.routing.target_group_arn(&target_group).await?;

        let container_port = config
            .container_definition
            .port_mappings
            .first()
            .map(|mapping| mapping.container_port)
            .ok_or_else(|| {
                CraneError::DeploymentParse(format!(
                    "containerDefinition {} declares no portMappings",
                    config.container_definition.name
                ))
            })?;

        let binding = LoadBalancerBinding {
            target_group_arn,
            container_name: config.container_definition.name.clone(),
            container_port,
        };

        self.scheduler
            .create_service(
                cluster,
                service_name,
                service_name,
                binding,
                config.desired_count,
            )
            .await?;

        tracing::info!("Service {} deployed to cluster {}", service_name, cluster);
        Ok(())
    }

    /// Drain the service to zero running tasks, then delete it.
    ///
    /// Polls the scheduler once per second with no upper bound; a task
    /// that never stops keeps the loop alive until the operator
    /// interrupts the process.
    pub async fn delete(&self, cluster: &str, service_name: &str) -> Result<()> {
        if self.find_service(cluster, service_name).await?.is_none() {
            return Err(CraneError::ServiceNotFound(service_name.to_string()));
        }

        self.scheduler
            .update_service_desired_count(cluster, service_name, 0)
            .await?;

        loop {
            match self.find_service(cluster, service_name).await? {
                Some(service) if service.running_count > 0 => {
                    tracing::debug!(
                        "Draining {}: {} tasks still running",
                        service_name,
                        service.running_count
                    );
                    tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
                }
                _ => break,
            }
        }

        self.scheduler.delete_service(cluster, service_name).await?;

        tracing::info!("Service {} deleted from cluster {}", service_name, cluster);
        Ok(())
    }

    /// List services deployed to the cluster, sorted by status.
    pub async fn list(&self, cluster: &str) -> Result<Vec<ServiceDescription>> {
        let mut services = self.scheduler.describe_services(cluster).await?;
        services.sort_by(|a, b| a.status.cmp(&b.status));
        Ok(services)
    }

    async fn find_service(
        &self,
        cluster: &str,
        service_name: &str,
    ) -> Result<Option<ServiceDescription>> {
        let services = self.scheduler.describe_services(cluster).await?;
        Ok(services
            .into_iter()
            .find(|service| service.name == service_name))
    }
}
