use deployhub::cli::commands::{CliArgs, Commands};
use deployhub::cli::handlers::{
    handle_analyze, handle_config, handle_deploy, handle_plan, handle_scale,
};
use deployhub::util::logging::{init_logging, parse_level, LoggingConfig};
use deployhub::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("deployhub v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args).await,
        Commands::Plan(plan_args) => handle_plan(plan_args).await,
        Commands::Deploy(deploy_args) => handle_deploy(deploy_args, args.quiet).await,
        Commands::Scale(scale_args) => handle_scale(scale_args).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("DEPLOYHUB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("DEPLOYHUB_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::default()
    });
}
