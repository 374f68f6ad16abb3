use crate::detection::ProjectType;
use crate::pipeline::Environment;
use crate::scaling::ScalingTargetKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Project detection, containerization and staged deployment
#[derive(Parser, Debug)]
#[command(
    name = "deployhub",
    about = "Detects a project's stack, generates container artifacts and deploys it",
    version,
    long_about = "deployhub classifies an uploaded project, renders Dockerfile and compose \
                  files for it and drives a staged deployment through the container runtime, \
                  Kubernetes and cloud hosting. It also recommends and applies scaling changes."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect the project type of a directory",
        long_about = "Scores the project tree against the built-in catalog and prints the \
                      resulting profile.\n\n\
                      Examples:\n  \
                      deployhub analyze ./my-app\n  \
                      deployhub analyze ./my-app --format json"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Render container artifacts for a project",
        long_about = "Analyzes the project and renders Dockerfile, compose files and \
                      .dockerignore. With --output the files are written to that directory.\n\n\
                      Examples:\n  \
                      deployhub plan ./my-app\n  \
                      deployhub plan ./my-app --output ./my-app"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Run a deployment to completion",
        long_about = "Submits a deployment and waits for it to reach success or failed.\n\n\
                      Examples:\n  \
                      deployhub deploy --project-name shop --path ./shop\n  \
                      deployhub deploy --project-name shop --kubernetes --auto-scaling\n  \
                      deployhub deploy --project-name shop --dry-run"
    )]
    Deploy(DeployArgs),

    #[command(
        about = "Recommend (and optionally apply) a scaling change",
        long_about = "Evaluates the scaling rules against the given utilization.\n\n\
                      Examples:\n  \
                      deployhub scale --kind ecs --target prod/api --cpu 85 --memory 50 --capacity 2\n  \
                      deployhub scale --kind k8s --target web --cpu 5 --memory 10 --capacity 4 --apply --dry-run"
    )]
    Scale(ScaleArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(value_name = "PATH", help = "Project directory")]
    pub path: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(value_name = "PATH", help = "Project directory")]
    pub path: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Write the artifacts into this directory"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeployArgs {
    #[arg(long, value_name = "NAME", help = "Project name")]
    pub project_name: String,

    #[arg(
        long,
        value_name = "PATH",
        help = "Project directory (defaults to <projects dir>/<project name>)"
    )]
    pub path: Option<PathBuf>,

    #[arg(long, value_parser = parse_project_type, help = "Expected project type; a mismatch with detection is logged")]
    pub project_type: Option<ProjectType>,

    #[arg(long, value_parser = parse_environment, default_value = "production")]
    pub environment: Environment,

    #[arg(long, help = "Deploy to Kubernetes")]
    pub kubernetes: bool,

    #[arg(long, help = "Skip generating container artifacts")]
    pub no_containerization: bool,

    #[arg(long, help = "Skip monitoring resources")]
    pub no_monitoring: bool,

    #[arg(long, help = "Configure auto-scaling")]
    pub auto_scaling: bool,

    #[arg(long, value_name = "DOMAIN", help = "Ingress host")]
    pub domain: Option<String>,

    #[arg(long, help = "Use in-memory collaborators instead of real tools")]
    pub dry_run: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ScaleArgs {
    #[arg(long, value_parser = parse_target_kind, help = "container-service (ecs), function (lambda) or kubernetes (k8s)")]
    pub kind: ScalingTargetKind,

    #[arg(long, value_name = "ID", help = "cluster/service, function name or namespace/deployment")]
    pub target: String,

    #[arg(long, default_value = "0", help = "CPU utilization percent")]
    pub cpu: f64,

    #[arg(long, default_value = "0", help = "Memory utilization percent")]
    pub memory: f64,

    #[arg(long, default_value = "0", help = "Requests in the window")]
    pub requests: f64,

    #[arg(long, help = "Current capacity")]
    pub capacity: u32,

    #[arg(long, help = "Apply the decision to the target")]
    pub apply: bool,

    #[arg(long, help = "Use in-memory collaborators instead of real tools")]
    pub dry_run: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_project_type(s: &str) -> Result<ProjectType, String> {
    s.parse::<ProjectType>()
}

fn parse_environment(s: &str) -> Result<Environment, String> {
    s.parse::<Environment>()
}

fn parse_target_kind(s: &str) -> Result<ScalingTargetKind, String> {
    ScalingTargetKind::from_name(s).ok_or_else(|| {
        format!(
            "Invalid target kind: {}. Valid options: container-service, ecs, function, lambda, kubernetes, k8s",
            s
        )
    })
}
