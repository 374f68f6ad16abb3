pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AnalyzeArgs, CliArgs, Commands, ConfigArgs, DeployArgs, PlanArgs, ScaleArgs};
pub use output::{OutputFormat, OutputFormatter};
