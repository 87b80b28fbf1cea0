//! Service deployment descriptor
//!
//! A deployment is described by a YAML file (by default `cloudcrane.yaml`)
//! holding the container specification, the desired task count, and the
//! load balancer the service attaches to. Field names are camelCase on
//! the wire.

use crate::error::{CraneError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default deployment descriptor file name
pub const DEFAULT_DEPLOYMENT_FILE: &str = "cloudcrane.yaml";

/// Service deployment descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// Container registered as the service's task definition
    pub container_definition: ContainerDefinition,
    /// Number of task copies the service keeps running
    pub desired_count: i32,
    /// Load balancer scheme the service attaches to (internal, internet-facing)
    pub load_balancer: String,
}

/// Container specification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    /// Container name
    pub name: String,
    /// Image reference
    pub image: String,
    /// CPU units reserved for the container
    pub cpu: i32,
    /// Memory limit in MiB
    pub memory: i32,
    /// Exposed ports
    #[serde(default)]
    pub port_mappings: Vec<PortMapping>,
}

/// Container/host port pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    /// Port the container listens on
    pub container_port: i32,
    /// Port opened on the instance
    pub host_port: Option<i32>,
    /// Protocol (tcp, udp)
    pub protocol: Option<String>,
}

impl DeploymentConfig {
    /// Load a deployment descriptor from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CraneError::DeploymentParse(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_str(&content)
    }

    /// Parse a deployment descriptor from a YAML string
    pub fn parse_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CraneError::DeploymentParse(format!("Failed to parse YAML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
containerDefinition:
  name: web
  image: example.org/repositories/web:latest
  cpu: 128
  memory: 128
  portMappings:
    - containerPort: 8080
      hostPort: 8080
      protocol: tcp
desiredCount: 2
loadBalancer: internal
"#;

    #[test]
    fn test_parse_descriptor() {
        let config = DeploymentConfig::parse_str(DESCRIPTOR).unwrap();

        assert_eq!(config.container_definition.name, "web");
        assert_eq!(
            config.container_definition.image,
            "example.org/repositories/web:latest"
        );
        assert_eq!(config.container_definition.cpu, 128);
        assert_eq!(config.container_definition.memory, 128);
        assert_eq!(config.container_definition.port_mappings.len(), 1);
        assert_eq!(
            config.container_definition.port_mappings[0].container_port,
            8080
        );
        assert_eq!(config.desired_count, 2);
        assert_eq!(config.load_balancer, "internal");
    }

    #[test]
    fn test_parse_descriptor_without_port_mappings() {
        let yaml = r#"
containerDefinition:
  name: worker
  image: example.org/repositories/worker:latest
  cpu: 256
  memory: 512
desiredCount: 1
loadBalancer: internal
"#;

        let config = DeploymentConfig::parse_str(yaml).unwrap();
        assert!(config.container_definition.port_mappings.is_empty());
    }

    #[test]
    fn test_parse_invalid_descriptor() {
        let result = DeploymentConfig::parse_str("desiredCount: [not a count");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_descriptor_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DEPLOYMENT_FILE);
        std::fs::write(&path, DESCRIPTOR).unwrap();

        let config = DeploymentConfig::from_file(&path).unwrap();
        assert_eq!(config.container_definition.name, "web");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = DeploymentConfig::from_file(&dir.path().join("missing.yaml"));
        assert!(result.is_err());
    }
}
