//! Command handlers; each returns the process exit code

use super::commands::{AnalyzeArgs, ConfigArgs, DeployArgs, PlanArgs, ScaleArgs};
use super::output::{OutputFormatter, ScalingReport};
use crate::collaborators::mock::MockCloud;
use crate::collaborators::Collaborators;
use crate::config::DeployhubConfig;
use crate::containerization::build_artifacts;
use crate::detection::ProjectAnalyzer;
use crate::error::DeployError;
use crate::pipeline::{DeploymentPipeline, DeploymentRequest, DeploymentStatus};
use crate::progress::NoOpHandler;
use crate::scaling::{decide, MetricsSnapshot};
use std::sync::Arc;
use tracing::{debug, error, info};

fn report_error(err: &DeployError) {
    error!(kind = err.kind(), "{}", err);
    eprintln!("Error: {}", err);
    if let Some(help) = err.help_message() {
        eprintln!("Help: {}", help);
    }
}

fn load_config() -> Option<DeployhubConfig> {
    let config = match DeployhubConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return None;
    }
    debug!("Configuration: {:?}", config);
    Some(config)
}

fn collaborators(config: &DeployhubConfig, dry_run: bool) -> Option<Collaborators> {
    if dry_run {
        info!("Dry run: using in-memory collaborators");
        return Some(Collaborators::mock(Arc::new(MockCloud::default())));
    }
    match Collaborators::system(config) {
        Ok(collaborators) => Some(collaborators),
        Err(e) => {
            eprintln!("Error: failed to initialize collaborators: {}", e);
            None
        }
    }
}

fn emit(output: anyhow::Result<String>) -> i32 {
    match output {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub async fn handle_analyze(args: &AnalyzeArgs) -> i32 {
    info!(path = %args.path.display(), "Analyzing project");
    match ProjectAnalyzer::new(&args.path).analyze().await {
        Ok(profile) => emit(OutputFormatter::new(args.format.into()).format_profile(&profile)),
        Err(e) => {
            report_error(&DeployError::from(e));
            1
        }
    }
}

pub async fn handle_plan(args: &PlanArgs) -> i32 {
    let artifacts = match ProjectAnalyzer::new(&args.path).analyze().await {
        Ok(profile) => build_artifacts(&profile).map_err(DeployError::from),
        Err(e) => Err(DeployError::from(e)),
    };
    let artifacts = match artifacts {
        Ok(artifacts) => artifacts,
        Err(e) => {
            report_error(&e);
            return 1;
        }
    };

    match &args.output {
        Some(dir) => match artifacts.write_to(dir).await {
            Ok(written) => {
                for path in written {
                    println!("Wrote {}", path.display());
                }
                0
            }
            Err(e) => {
                report_error(&DeployError::from(e));
                1
            }
        },
        None => {
            let formatter = OutputFormatter::new(super::output::OutputFormat::Human);
            print!("{}", formatter.format_artifacts(&artifacts));
            0
        }
    }
}

pub async fn handle_deploy(args: &DeployArgs, quiet: bool) -> i32 {
    let Some(mut config) = load_config() else {
        return 1;
    };
    // Dry runs leave the project tree untouched
    if args.dry_run {
        config.write_artifacts = false;
    }
    let Some(collaborators) = collaborators(&config, args.dry_run) else {
        return 1;
    };

    let mut request = DeploymentRequest::new(args.project_name.clone());
    request.project_type = args.project_type;
    request.environment = args.environment;
    request.enable_containerization = !args.no_containerization;
    request.enable_kubernetes = args.kubernetes;
    request.enable_monitoring = !args.no_monitoring;
    request.enable_auto_scaling = args.auto_scaling;
    request.domain = args.domain.clone();

    let project_dir = args
        .path
        .clone()
        .unwrap_or_else(|| config.project_dir(&args.project_name));

    let mut pipeline = DeploymentPipeline::new(config, collaborators);
    if quiet {
        pipeline = pipeline.with_progress_handler(Arc::new(NoOpHandler));
    }

    let record = match pipeline.submit_at(request, project_dir).await {
        Ok(id) => pipeline.wait(id).await,
        Err(e) => Err(e),
    };
    let record = match record {
        Ok(record) => record,
        Err(e) => {
            report_error(&e);
            return 1;
        }
    };

    let code = emit(OutputFormatter::new(args.format.into()).format_record(&record));
    if record.status == DeploymentStatus::Success {
        code
    } else {
        1
    }
}

pub async fn handle_scale(args: &ScaleArgs) -> i32 {
    let snapshot = MetricsSnapshot::new(args.cpu, args.memory, args.requests, args.capacity);
    let decision = decide(&snapshot);
    let formatter = OutputFormatter::new(args.format.into());

    if !args.apply {
        return emit(formatter.format_scaling(&ScalingReport {
            decision: &decision,
            outcome: None,
        }));
    }

    let Some(config) = load_config() else {
        return 1;
    };
    let Some(collaborators) = collaborators(&config, args.dry_run) else {
        return 1;
    };
    let pipeline = DeploymentPipeline::new(config, collaborators);

    match pipeline
        .apply_scaling(&args.kind, &args.target, &decision)
        .await
    {
        Ok(outcome) => emit(formatter.format_scaling(&ScalingReport {
            decision: &decision,
            outcome: Some(&outcome),
        })),
        Err(e) => {
            report_error(&e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let Some(config) = load_config() else {
        return 1;
    };
    emit(OutputFormatter::new(args.format.into()).format_config(&config))
}
