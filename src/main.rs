//! Cloudcrane - deploy application stacks with AWS CloudFormation and ECS
//!
//! This is the main CLI entry point for Cloudcrane.

use clap::{Parser, Subcommand};
use cloudcrane::cloud::aws::{self, CloudFormationStacks, EcsScheduler, ElbRouting};
use cloudcrane::cluster::{ClusterController, ClusterSpec};
use cloudcrane::config::{DeploymentConfig, DEFAULT_DEPLOYMENT_FILE};
use cloudcrane::error::Result;
use cloudcrane::service::ServiceController;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cloudcrane - ECS cluster and service deployment
#[derive(Parser)]
#[command(name = "cloudcrane")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Deploy application stacks with AWS CloudFormation and ECS", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// AWS region (defaults to the environment's region)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage ECS clusters
    Cluster {
        #[command(subcommand)]
        command: ClusterCommands,
    },

    /// Manage services in an ECS cluster
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
}

#[derive(Subcommand)]
enum ClusterCommands {
    /// Create a cluster and its infrastructure stack
    Create {
        /// Name of the ECS cluster
        #[arg(long, default_value = "default")]
        cluster_name: String,
        /// ID of the AMI used for the cluster instances
        #[arg(long)]
        ami: String,
        /// EC2 instance type
        #[arg(long, default_value = "t2.micro")]
        instance_type: String,
        /// Maximum number of EC2 instances in the auto-scaling group
        #[arg(long, default_value = "1")]
        max_instances: String,
    },

    /// List cluster stacks
    List {
        /// Include fully deleted stacks
        #[arg(short, long)]
        all: bool,
    },

    /// Delete a cluster and its infrastructure stack
    Delete {
        /// Name of the ECS cluster
        #[arg(long, default_value = "default")]
        cluster_name: String,
    },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// Deploy a service to a cluster
    Deploy {
        /// Name of the application
        #[arg(long)]
        application: String,
        /// Version of the application
        #[arg(long)]
        version: Option<String>,
        /// Name of the ECS cluster
        #[arg(long, default_value = "default")]
        cluster_name: String,
        /// YAML file with the service deployment descriptor
        #[arg(long, default_value = DEFAULT_DEPLOYMENT_FILE)]
        parameters: PathBuf,
    },

    /// Drain and delete a service
    Delete {
        /// Name of the application
        #[arg(long)]
        application: String,
        /// Version of the application
        #[arg(long)]
        version: Option<String>,
        /// Name of the ECS cluster
        #[arg(long, default_value = "default")]
        cluster_name: String,
    },

    /// List services in a cluster
    List {
        /// Name of the ECS cluster
        #[arg(long, default_value = "default")]
        cluster_name: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = aws::load_config(cli.region).await;

    match cli.command {
        Commands::Cluster { command } => {
            let controller = ClusterController::new(
                CloudFormationStacks::new(&config),
                EcsScheduler::new(&config),
            );

            match command {
                ClusterCommands::Create {
                    cluster_name,
                    ami,
                    instance_type,
                    max_instances,
                } => {
                    let spec = ClusterSpec {
                        name: cluster_name,
                        ami,
                        instance_type,
                        max_instances,
                    };
                    controller.create(&spec).await?;
                    println!("{}", spec.name);
                }

                ClusterCommands::List { all } => {
                    let stacks = controller.list(all).await?;
                    println!(
                        "{:<24} {:<36} {:<12} {}",
                        "NAME", "STATUS", "CREATED", "DESCRIPTION"
                    );
                    for stack in stacks {
                        println!(
                            "{:<24} {:<36} {:<12} {}",
                            stack.name, stack.status, stack.creation_time, stack.description
                        );
                    }
                }

                ClusterCommands::Delete { cluster_name } => {
                    controller.delete(&cluster_name).await?;
                    println!("{}", cluster_name);
                }
            }
        }

        Commands::Service { command } => {
            let controller =
                ServiceController::new(EcsScheduler::new(&config), ElbRouting::new(&config));

            match command {
                ServiceCommands::Deploy {
                    application,
                    version,
                    cluster_name,
                    parameters,
                } => {
                    let service_name = service_name(&application, version.as_deref());
                    let deployment = DeploymentConfig::from_file(&parameters)?;
                    controller
                        .deploy(&cluster_name, &service_name, &deployment)
                        .await?;
                    println!("{}", service_name);
                }

                ServiceCommands::Delete {
                    application,
                    version,
                    cluster_name,
                } => {
                    let service_name = service_name(&application, version.as_deref());
                    controller.delete(&cluster_name, &service_name).await?;
                    println!("{}", service_name);
                }

                ServiceCommands::List { cluster_name } => {
                    let services = controller.list(&cluster_name).await?;
                    println!("{:<24} {:<10} {}", "NAME", "STATUS", "TASKS");
                    for service in services {
                        println!(
                            "{:<24} {:<10} {}/{}",
                            service.name, service.status, service.running_count,
                            service.desired_count
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Service names are `{application}-{version}` when a version is given
fn service_name(application: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{}-{}", application, version),
        None => application.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::service_name;

    #[test]
    fn test_service_name_with_version() {
        assert_eq!(service_name("web", Some("1")), "web-1");
    }

    #[test]
    fn test_service_name_without_version() {
        assert_eq!(service_name("web", None), "web");
    }
}
