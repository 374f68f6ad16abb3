//! Output formatting for the CLI
//!
//! Every command result can be rendered as JSON, YAML or human-readable text.
//!
//! # Example
//!
//! ```ignore
//! use deployhub::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! println!("{}", formatter.format_profile(&profile)?);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::DeployhubConfig;
use crate::containerization::ContainerArtifacts;
use crate::detection::ProjectProfile;
use crate::pipeline::{DeploymentRecord, DeploymentStatus};
use crate::scaling::{ScalingDecision, ScalingOutcome};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Scaling decision plus the outcome of applying it, when it was applied
#[derive(Debug, Serialize)]
pub struct ScalingReport<'a> {
    pub decision: &'a ScalingDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'a ScalingOutcome>,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn structured<T: Serialize>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
            _ => serde_yaml::to_string(value)
                .with_context(|| format!("Failed to serialize {} to YAML", what)),
        }
    }

    pub fn format_profile(&self, profile: &ProjectProfile) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_profile_human(profile)),
            _ => self.structured(profile, "project profile"),
        }
    }

    pub fn format_record(&self, record: &DeploymentRecord) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_record_human(record)),
            _ => self.structured(record, "deployment record"),
        }
    }

    pub fn format_scaling(&self, report: &ScalingReport<'_>) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_scaling_human(report)),
            _ => self.structured(report, "scaling decision"),
        }
    }

    pub fn format_config(&self, config: &DeployhubConfig) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(config.to_string()),
            _ => self.structured(&config.to_display_map(), "config"),
        }
    }

    /// Artifacts are always shown as file listings
    pub fn format_artifacts(&self, artifacts: &ContainerArtifacts) -> String {
        let mut output = String::new();
        for (name, content) in artifacts.files() {
            output.push_str(&format!("# --- {} ---\n", name));
            output.push_str(content);
            if !content.ends_with('\n') {
                output.push('\n');
            }
            output.push('\n');
        }
        output
    }

    fn format_profile_human(&self, profile: &ProjectProfile) -> String {
        let mut output = String::new();

        if profile.confidence_score >= 0.5 {
            output.push_str("\u{2713} Project Analysis\n");
        } else {
            output.push_str("\u{26A0} Project Analysis (Low Confidence)\n");
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Project Type:  {}\n", profile.project_type));
        if let Some(manager) = &profile.package_manager {
            output.push_str(&format!("Package Mgr:   {}\n", manager));
        }
        if let Some(version) = &profile.framework_version {
            output.push_str(&format!("Version:       {}\n", version));
        }
        output.push('\n');

        output.push_str("Build Information:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} Build:   {}\n",
            profile.build_command.as_deref().unwrap_or("(none)")
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Output:  {}\n\n",
            profile.output_dir.as_deref().unwrap_or("(none)")
        ));

        output.push_str("Container:\n");
        output.push_str(&format!("\u{251C}\u{2500} Base Image: {}\n", profile.base_image));
        output.push_str(&format!("\u{251C}\u{2500} Strategy:   {}\n", profile.dockerfile_strategy));
        output.push_str(&format!("\u{251C}\u{2500} Port:       {}\n", profile.port));
        output.push_str(&format!("\u{2514}\u{2500} Health:     {}\n\n", profile.health_check.test));

        if !profile.dependencies.is_empty() {
            output.push_str(&format!("Dependencies: {}\n", profile.dependencies.join(", ")));
        }

        let filled = (profile.confidence_score * 10.0).round() as usize;
        let bar = "\u{2588}".repeat(filled.min(10)) + &"\u{2591}".repeat(10 - filled.min(10));
        output.push_str(&format!(
            "Confidence: {} {:.0}%\n",
            bar,
            profile.confidence_score * 100.0
        ));

        output
    }

    fn format_record_human(&self, record: &DeploymentRecord) -> String {
        let mut output = String::new();

        let header = match record.status {
            DeploymentStatus::Success => "\u{2713} Deployment succeeded",
            DeploymentStatus::Failed => "\u{2717} Deployment failed",
            _ => "\u{2026} Deployment in progress",
        };
        output.push_str(header);
        output.push('\n');
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("ID:          {}\n", record.id));
        output.push_str(&format!("Project:     {}\n", record.project_name));
        output.push_str(&format!("Environment: {}\n", record.environment()));
        output.push_str(&format!("Status:      {} ({}%)\n", record.status, record.progress));
        if let Some(url) = &record.url {
            output.push_str(&format!("URL:         {}\n", url));
        }
        output.push('\n');

        if !record.resources_created.is_empty() {
            output.push_str("Resources:\n");
            for resource in &record.resources_created {
                output.push_str(&format!("  - {}\n", resource));
            }
            output.push('\n');
        }

        if !record.resources_failed.is_empty() {
            output.push_str("\u{26A0} Incomplete:\n");
            for resource in &record.resources_failed {
                output.push_str(&format!("  - {}\n", resource));
            }
            output.push('\n');
        }

        if !record.errors.is_empty() {
            output.push_str("Errors:\n");
            for error in &record.errors {
                output.push_str(&format!("  - {}\n", error));
            }
            output.push('\n');
        }

        output.push_str("Log:\n");
        for entry in &record.logs {
            output.push_str(&format!(
                "  {} {}\n",
                entry.timestamp.format("%H:%M:%S"),
                entry.message
            ));
        }

        output
    }

    fn format_scaling_human(&self, report: &ScalingReport<'_>) -> String {
        let decision = report.decision;
        let mut output = String::new();

        output.push_str("Scaling Decision\n");
        output.push_str(RULE);
        output.push_str("\n\n");
        output.push_str(&format!("Direction:   {}\n", decision.direction));
        output.push_str(&format!(
            "Capacity:    {} -> {}\n",
            decision.metrics.current_capacity, decision.target_capacity
        ));
        output.push_str(&format!("Confidence:  {:.1}\n", decision.confidence));
        output.push_str(&format!("Reason:      {}\n", decision.reason));

        match report.outcome {
            Some(ScalingOutcome::Applied { message, .. }) => {
                output.push_str(&format!("\n\u{2713} {}\n", message));
            }
            Some(ScalingOutcome::Degraded {
                missing_permissions,
                manual_commands,
                error,
                ..
            }) => {
                output.push_str(&format!("\n\u{26A0} Not applied: {}\n", error));
                output.push_str(&format!(
                    "Missing permissions: {}\n",
                    missing_permissions.join(", ")
                ));
                output.push_str("Run manually:\n");
                for command in manual_commands {
                    output.push_str(&format!("  {}\n", command));
                }
            }
            None => {}
        }

        output
    }
}
