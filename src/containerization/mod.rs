//! Containerization planning
//!
//! [`plan`] is a static lookup from project type to base image, port and Dockerfile
//! strategy. [`build_artifacts`] renders the Dockerfile, compose files and
//! `.dockerignore` for a profile by dispatching on its strategy.

pub mod artifacts;
pub mod strategy;
pub mod templates;

pub use artifacts::{build_artifacts, ContainerArtifacts, ContainerizationError};
pub use strategy::{plan, ContainerPlan, DockerfileStrategy};
