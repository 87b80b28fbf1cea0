//! AWS-backed implementations of the provisioning seams
//!
//! One thin adapter per AWS client: CloudFormation for stacks, ECS for
//! clusters and services, Elastic Load Balancing v2 for target group
//! lookups. Remote errors convert into [`CraneError`] variants and
//! propagate unmodified.

use super::{
    LoadBalancerBinding, RoutingApi, SchedulerApi, ServiceDescription, StackApi, StackSummary,
};
use crate::config::ContainerDefinition;
use crate::error::{CraneError, Result};
use crate::template::RenderedTemplate;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudformation::types::{Capability, Parameter, StackStatus, Tag};
use aws_sdk_ecs::types::{LaunchType, PortMapping, TransportProtocol};

/// Load the shared AWS configuration, optionally pinning a region.
///
/// Without an explicit region the SDK default chain applies (environment,
/// profile, instance metadata).
pub async fn load_config(region: Option<String>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region));
    }
    loader.load().await
}

/// CloudFormation-backed stack provisioning
pub struct CloudFormationStacks {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStacks {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudformation::Client::new(config),
        }
    }
}

#[async_trait]
impl StackApi for CloudFormationStacks {
    async fn create_stack(&self, name: &str, template: &RenderedTemplate) -> Result<()> {
        let parameters = template
            .parameters
            .iter()
            .map(|parameter| {
                Parameter::builder()
                    .parameter_key(&parameter.key)
                    .parameter_value(&parameter.value)
                    .build()
            })
            .collect();

        let tag = Tag::builder().key("name").value(name).build();

        self.client
            .create_stack()
            .stack_name(name)
            .template_body(template.body)
            .set_parameters(Some(parameters))
            .disable_rollback(false)
            .capabilities(Capability::CapabilityIam)
            .tags(tag)
            .send()
            .await
            .map_err(aws_sdk_cloudformation::Error::from)?;

        tracing::debug!("Stack {} submitted", name);
        Ok(())
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(aws_sdk_cloudformation::Error::from)?;

        tracing::debug!("Stack {} deletion initiated", name);
        Ok(())
    }

    async fn list_stacks(&self, status_filter: &[&str]) -> Result<Vec<StackSummary>> {
        let mut request = self.client.list_stacks();
        for status in status_filter {
            request = request.stack_status_filter(StackStatus::from(*status));
        }

        let response = request
            .send()
            .await
            .map_err(aws_sdk_cloudformation::Error::from)?;

        let stacks = response
            .stack_summaries()
            .iter()
            .map(|stack| StackSummary {
                name: stack.stack_name().unwrap_or_default().to_string(),
                status: stack
                    .stack_status()
                    .map(|status| status.as_str().to_string())
                    .unwrap_or_default(),
                creation_time: stack.creation_time().map(|time| time.secs()).unwrap_or(0),
                description: stack.template_description().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(stacks)
    }
}

/// ECS-backed scheduler operations
pub struct EcsScheduler {
    client: aws_sdk_ecs::Client,
}

impl EcsScheduler {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ecs::Client::new(config),
        }
    }
}

#[async_trait]
impl SchedulerApi for EcsScheduler {
    async fn create_cluster(&self, name: &str) -> Result<()> {
        self.client
            .create_cluster()
            .cluster_name(name)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;
        Ok(())
    }

    async fn delete_cluster(&self, name: &str) -> Result<()> {
        self.client
            .delete_cluster()
            .cluster(name)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;
        Ok(())
    }

    async fn register_task_definition(
        &self,
        family: &str,
        container: &ContainerDefinition,
    ) -> Result<()> {
        let port_mappings = container
            .port_mappings
            .iter()
            .map(|mapping| {
                let mut builder = PortMapping::builder().container_port(mapping.container_port);
                if let Some(host_port) = mapping.host_port {
                    builder = builder.host_port(host_port);
                }
                if let Some(protocol) = &mapping.protocol {
                    builder = builder.protocol(TransportProtocol::from(protocol.as_str()));
                }
                builder.build()
            })
            .collect();

        let definition = aws_sdk_ecs::types::ContainerDefinition::builder()
            .name(&container.name)
            .image(&container.image)
            .cpu(container.cpu)
            .memory(container.memory)
            .set_port_mappings(Some(port_mappings))
            .build();

        self.client
            .register_task_definition()
            .family(family)
            .task_role_arn("")
            .set_volumes(Some(Vec::new()))
            .container_definitions(definition)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;

        tracing::debug!("Task definition {} registered", family);
        Ok(())
    }

    async fn create_service(
        &self,
        cluster: &str,
        service_name: &str,
        task_definition: &str,
        load_balancer: LoadBalancerBinding,
        desired_count: i32,
    ) -> Result<()> {
        let binding = aws_sdk_ecs::types::LoadBalancer::builder()
            .target_group_arn(load_balancer.target_group_arn)
            .container_name(load_balancer.container_name)
            .container_port(load_balancer.container_port)
            .build();

        self.client
            .create_service()
            .cluster(cluster)
            .service_name(service_name)
            .task_definition(task_definition)
            .load_balancers(binding)
            .desired_count(desired_count)
            .launch_type(LaunchType::Ec2)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;
        Ok(())
    }

    async fn update_service_desired_count(
        &self,
        cluster: &str,
        service_name: &str,
        desired_count: i32,
    ) -> Result<()> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(service_name)
            .desired_count(desired_count)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;
        Ok(())
    }

    async fn delete_service(&self, cluster: &str, service_name: &str) -> Result<()> {
        self.client
            .delete_service()
            .cluster(cluster)
            .service(service_name)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;
        Ok(())
    }

    async fn describe_services(&self, cluster: &str) -> Result<Vec<ServiceDescription>> {
        let listed = self
            .client
            .list_services()
            .cluster(cluster)
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;

        let arns = listed.service_arns();
        if arns.is_empty() {
            return Ok(Vec::new());
        }

        let described = self
            .client
            .describe_services()
            .cluster(cluster)
            .set_services(Some(arns.to_vec()))
            .send()
            .await
            .map_err(aws_sdk_ecs::Error::from)?;

        let services = described
            .services()
            .iter()
            .map(|service| ServiceDescription {
                name: service.service_name().unwrap_or_default().to_string(),
                status: service.status().unwrap_or_default().to_string(),
                running_count: service.running_count(),
                desired_count: service.desired_count(),
            })
            .collect();

        Ok(services)
    }
}

/// Elastic Load Balancing v2 routing lookups
pub struct ElbRouting {
    client: aws_sdk_elasticloadbalancingv2::Client,
}

impl ElbRouting {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_elasticloadbalancingv2::Client::new(config),
        }
    }
}

#[async_trait]
impl RoutingApi for ElbRouting {
    async fn target_group_arn(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .describe_target_groups()
            .names(name)
            .send()
            .await
            .map_err(aws_sdk_elasticloadbalancingv2::Error::from)?;

        let arn = response
            .target_groups()
            .first()
            .and_then(|group| group.target_group_arn())
            .ok_or_else(|| CraneError::TargetGroupNotFound(name.to_string()))?;

        Ok(arn.to_string())
    }
}
