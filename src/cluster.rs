//! Cluster lifecycle management
//!
//! A cluster is a scheduler-side identity plus one infrastructure stack
//! rendered from the embedded template. The two remote calls are
//! independent; a failure in the second leaves the first's result behind
//! for the operator to clean up.

use crate::cloud::{SchedulerApi, StackApi, StackSummary};
use crate::error::Result;
use crate::template;

/// Stack states reported for clusters that have not been fully deleted
const ACTIVE_STACK_STATUSES: &[&str] = &[
    "CREATE_IN_PROGRESS",
    "CREATE_FAILED",
    "CREATE_COMPLETE",
    "ROLLBACK_IN_PROGRESS",
    "ROLLBACK_FAILED",
    "ROLLBACK_COMPLETE",
    "DELETE_IN_PROGRESS",
    "DELETE_FAILED",
    "UPDATE_IN_PROGRESS",
    "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_COMPLETE",
    "UPDATE_ROLLBACK_IN_PROGRESS",
    "UPDATE_ROLLBACK_FAILED",
    "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_ROLLBACK_COMPLETE",
    "REVIEW_IN_PROGRESS",
];

/// Cluster creation request
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    /// Cluster name, also used as the stack name
    pub name: String,
    /// Machine image for the cluster instances
    pub ami: String,
    /// EC2 instance type
    pub instance_type: String,
    /// Maximum size of the auto-scaling group
    pub max_instances: String,
}

/// Cluster lifecycle orchestration over the provisioning seams
pub struct ClusterController<S, C> {
    stacks: S,
    scheduler: C,
}

impl<S: StackApi, C: SchedulerApi> ClusterController<S, C> {
    pub fn new(stacks: S, scheduler: C) -> Self {
        Self { stacks, scheduler }
    }

    /// Create a cluster: register the identity, then submit the stack.
    pub async fn create(&self, spec: &ClusterSpec) -> Result<()> {
        self.scheduler.create_cluster(&spec.name).await?;

        let parameters = [
            ("EcsClusterName", spec.name.as_str()),
            ("EcsAmiId", spec.ami.as_str()),
            ("EcsInstanceType", spec.instance_type.as_str()),
            ("AsgMaxSize", spec.max_instances.as_str()),
        ];

        let rendered = template::render(&parameters);
        self.stacks.create_stack(&spec.name, &rendered).await?;

        tracing::info!("Cluster {} creation submitted", spec.name);
        Ok(())
    }

    /// Delete a cluster: tear down the stack, then remove the identity.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.stacks.delete_stack(name).await?;
        self.scheduler.delete_cluster(name).await?;

        tracing::info!("Cluster {} deletion submitted", name);
        Ok(())
    }

    /// List cluster stacks sorted ascending by name.
    ///
    /// Fully deleted stacks are excluded unless `include_deleted` is set;
    /// the filtering happens remotely through the status filter.
    pub async fn list(&self, include_deleted: bool) -> Result<Vec<StackSummary>> {
        let status_filter: &[&str] = if include_deleted {
            &[]
        } else {
            ACTIVE_STACK_STATUSES
        };

        let mut stacks = self.stacks.list_stacks(status_filter).await?;
        stacks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{LoadBalancerBinding, ServiceDescription};
    use crate::config::ContainerDefinition;
    use crate::template::RenderedTemplate;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeStacks {
        calls: Arc<Mutex<Vec<String>>>,
        templates: Arc<Mutex<Vec<RenderedTemplate>>>,
        filters: Arc<Mutex<Vec<Vec<String>>>>,
        stacks: Vec<StackSummary>,
    }

    #[async_trait]
    impl StackApi for FakeStacks {
        async fn create_stack(&self, name: &str, template: &RenderedTemplate) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create_stack:{}", name));
            self.templates.lock().unwrap().push(template.clone());
            Ok(())
        }

        async fn delete_stack(&self, name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete_stack:{}", name));
            Ok(())
        }

        async fn list_stacks(&self, status_filter: &[&str]) -> Result<Vec<StackSummary>> {
            self.filters
                .lock()
                .unwrap()
                .push(status_filter.iter().map(|s| s.to_string()).collect());
            Ok(self.stacks.clone())
        }
    }

    #[derive(Clone, Default)]
    struct FakeScheduler {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SchedulerApi for FakeScheduler {
        async fn create_cluster(&self, name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create_cluster:{}", name));
            Ok(())
        }

        async fn delete_cluster(&self, name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete_cluster:{}", name));
            Ok(())
        }

        async fn register_task_definition(
            &self,
            _family: &str,
            _container: &ContainerDefinition,
        ) -> Result<()> {
            Ok(())
        }

        async fn create_service(
            &self,
            _cluster: &str,
            _service_name: &str,
            _task_definition: &str,
            _load_balancer: LoadBalancerBinding,
            _desired_count: i32,
        ) -> Result<()> {
            Ok(())
        }

        async fn update_service_desired_count(
            &self,
            _cluster: &str,
            _service_name: &str,
            _desired_count: i32,
        ) -> Result<()> {
            Ok(())
        }

        async fn delete_service(&self, _cluster: &str, _service_name: &str) -> Result<()> {
            Ok(())
        }

        async fn describe_services(&self, _cluster: &str) -> Result<Vec<ServiceDescription>> {
            Ok(Vec::new())
        }
    }

    fn controller_with(
        stacks: FakeStacks,
        calls: Arc<Mutex<Vec<String>>>,
    ) -> ClusterController<FakeStacks, FakeScheduler> {
        let scheduler = FakeScheduler { calls };
        ClusterController::new(stacks, scheduler)
    }

    fn spec() -> ClusterSpec {
        ClusterSpec {
            name: "web".to_string(),
            ami: "ami-0123456789".to_string(),
            instance_type: "t2.micro".to_string(),
            max_instances: "3".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_registers_identity_before_stack() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let stacks = FakeStacks {
            calls: calls.clone(),
            ..Default::default()
        };
        let templates = stacks.templates.clone();

        let controller = controller_with(stacks, calls.clone());
        controller.create(&spec()).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["create_cluster:web", "create_stack:web"]
        );

        let templates = templates.lock().unwrap();
        let parameters: Vec<(String, String)> = templates[0]
            .parameters
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        assert_eq!(
            parameters,
            vec![
                ("EcsClusterName".to_string(), "web".to_string()),
                ("EcsAmiId".to_string(), "ami-0123456789".to_string()),
                ("EcsInstanceType".to_string(), "t2.micro".to_string()),
                ("AsgMaxSize".to_string(), "3".to_string()),
            ]
        );
        assert!(templates[0].body.contains("AWSTemplateFormatVersion"));
    }

    #[tokio::test]
    async fn test_delete_removes_stack_before_identity() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let stacks = FakeStacks {
            calls: calls.clone(),
            ..Default::default()
        };

        let controller = controller_with(stacks, calls.clone());
        controller.delete("web").await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["delete_stack:web", "delete_cluster:web"]
        );
    }

    #[tokio::test]
    async fn test_list_filters_deleted_stacks() {
        let stacks = FakeStacks::default();
        let filters = stacks.filters.clone();

        let controller = controller_with(stacks, Arc::new(Mutex::new(Vec::new())));
        controller.list(false).await.unwrap();

        let filters = filters.lock().unwrap();
        assert_eq!(filters[0].len(), 16);
        assert!(!filters[0].contains(&"DELETE_COMPLETE".to_string()));
        assert!(filters[0].contains(&"CREATE_COMPLETE".to_string()));
        assert!(filters[0].contains(&"REVIEW_IN_PROGRESS".to_string()));
    }

    #[tokio::test]
    async fn test_list_all_passes_empty_filter() {
        let stacks = FakeStacks::default();
        let filters = stacks.filters.clone();

        let controller = controller_with(stacks, Arc::new(Mutex::new(Vec::new())));
        controller.list(true).await.unwrap();

        assert!(filters.lock().unwrap()[0].is_empty());
    }

    #[tokio::test]
    async fn test_list_sorts_by_name() {
        let stacks = FakeStacks {
            stacks: vec![
                StackSummary {
                    name: "deleted-stack".to_string(),
                    status: "DELETE_COMPLETE".to_string(),
                    creation_time: 0,
                    description: "AWS CloudFormation template".to_string(),
                },
                StackSummary {
                    name: "active-stack".to_string(),
                    status: "CREATE_COMPLETE".to_string(),
                    creation_time: 0,
                    description: "AWS CloudFormation template".to_string(),
                },
            ],
            ..Default::default()
        };

        let controller = controller_with(stacks, Arc::new(Mutex::new(Vec::new())));
        let listed = controller.list(true).await.unwrap();

        let names: Vec<&str> = listed.iter().map(|stack| stack.name.as_str()).collect();
        assert_eq!(names, vec!["active-stack", "deleted-stack"]);
    }
}
