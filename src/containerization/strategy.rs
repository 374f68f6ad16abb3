use crate::define_id_enum;
use crate::detection::ProjectType;

define_id_enum! {
    /// Selects the Dockerfile generator for a profile
    DockerfileStrategy {
        /// Node build stage, nginx runtime stage
        MultiStageBuild => "multi-stage-build",
        NextjsOptimized => "nextjs-optimized",
        NuxtOptimized => "nuxt-optimized",
        PythonOptimized => "python-optimized",
        JavaOptimized => "java-optimized",
        GoOptimized => "go-optimized",
        RustOptimized => "rust-optimized",
        PhpFpm => "php-fpm",
        StaticSite => "static-site",
        /// Single stage from the base image
        Simple => "simple" | "generic",
    }
}

impl DockerfileStrategy {
    /// Strategies whose runtime stage is nginx serving built files
    pub fn serves_with_nginx(&self) -> bool {
        matches!(
            self,
            DockerfileStrategy::MultiStageBuild | DockerfileStrategy::StaticSite
        )
    }
}

/// Static planner row for one project type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPlan {
    pub base_image: &'static str,
    pub port: u16,
    pub strategy: DockerfileStrategy,
}

/// Base image, exposed port and Dockerfile strategy for a project type
///
/// `unknown` uses the static row.
pub fn plan(project_type: ProjectType) -> ContainerPlan {
    let (base_image, port, strategy) = match project_type {
        ProjectType::React => ("node:18-alpine", 3000, DockerfileStrategy::MultiStageBuild),
        ProjectType::Vue => ("node:18-alpine", 8080, DockerfileStrategy::MultiStageBuild),
        ProjectType::Angular => ("node:18-alpine", 4200, DockerfileStrategy::MultiStageBuild),
        ProjectType::Nextjs => ("node:18-alpine", 3000, DockerfileStrategy::NextjsOptimized),
        ProjectType::Nuxt => ("node:18-alpine", 3000, DockerfileStrategy::NuxtOptimized),
        ProjectType::Svelte => ("node:18-alpine", 5173, DockerfileStrategy::MultiStageBuild),
        ProjectType::Python => ("python:3.11-slim", 8000, DockerfileStrategy::PythonOptimized),
        ProjectType::Java => ("openjdk:17-jre-slim", 8080, DockerfileStrategy::JavaOptimized),
        ProjectType::Go => ("golang:1.21-alpine", 8080, DockerfileStrategy::GoOptimized),
        ProjectType::Rust => ("rust:1.75-slim", 8080, DockerfileStrategy::RustOptimized),
        ProjectType::Php => ("php:8.2-fpm-alpine", 80, DockerfileStrategy::PhpFpm),
        ProjectType::Static | ProjectType::Unknown => {
            ("nginx:alpine", 80, DockerfileStrategy::StaticSite)
        }
    };

    ContainerPlan {
        base_image,
        port,
        strategy,
    }
}
