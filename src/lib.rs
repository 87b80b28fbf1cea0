//! Cloudcrane - deploy application stacks with AWS CloudFormation and ECS
//!
//! Cloudcrane is a thin command-line client over the managed AWS APIs:
//!
//! - Cluster lifecycle backed by an embedded CloudFormation template
//! - Service deployment from a YAML descriptor
//! - Drain-and-delete service removal
//! - Tabular listings of stacks and services

pub mod cloud;
pub mod cluster;
pub mod config;
pub mod error;
pub mod service;
pub mod template;

pub use error::{CraneError, Result};
