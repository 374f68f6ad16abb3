//! Deployment stages, in execution order
//!
//! Each stage owns one [`DeploymentStatus`](super::DeploymentStatus) and its
//! progress checkpoints. Disabled stages are skipped by the executor.

#[path = "01_detect.rs"]
pub mod detect;
#[path = "02_containerize.rs"]
pub mod containerize;
#[path = "03_build.rs"]
pub mod build;
#[path = "04_deploy.rs"]
pub mod deploy;
#[path = "05_configure.rs"]
pub mod configure;

pub use build::BuildStage;
pub use configure::ConfigureStage;
pub use containerize::ContainerizeStage;
pub use deploy::DeployStage;
pub use detect::DetectStage;

use super::stage::DeploymentStage;

/// The full stage sequence
pub fn default_stages() -> Vec<Box<dyn DeploymentStage>> {
    vec![
        Box::new(DetectStage),
        Box::new(ContainerizeStage),
        Box::new(BuildStage),
        Box::new(DeployStage),
        Box::new(ConfigureStage),
    ]
}
