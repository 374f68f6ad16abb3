//! Error taxonomy shared by every deployhub operation
//!
//! Synchronous operations (`analyze`, `plan`, `get`, ...) return [`DeployError`]
//! directly. Failures inside a running deployment never reach the submitter; they are
//! recorded on the deployment record instead.

use crate::containerization::ContainerizationError;
use crate::detection::AnalysisError;
use crate::store::StoreError;
use thiserror::Error;

pub type DeployResult<T> = Result<T, DeployError>;

/// A malformed deployment, rollback or scaling request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Project detection failed: {0}")]
    Detection(#[from] AnalysisError),

    #[error("Containerization failed: {0}")]
    Containerization(#[from] ContainerizationError),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Deployment failed: {0}")]
    Deployment(String),

    #[error("Scaling failed: {0}")]
    Scaling(String),

    #[error("Permission denied for {operation} (missing: {})", .missing_permissions.join(", "))]
    Permission {
        operation: String,
        missing_permissions: Vec<String>,
    },

    #[error("Not found: {id}")]
    NotFound { id: String },

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
}

impl DeployError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Detection(_) => "detection_error",
            Self::Containerization(_) => "containerization_error",
            Self::Build(_) => "build_error",
            Self::Deployment(_) => "deployment_error",
            Self::Scaling(_) => "scaling_error",
            Self::Permission { .. } => "permission_error",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation_error",
        }
    }

    pub fn help_message(&self) -> Option<String> {
        match self {
            Self::Detection(AnalysisError::PathNotFound(path)) => Some(format!(
                "Upload the project first; nothing exists at {}",
                path.display()
            )),
            Self::Detection(AnalysisError::PermissionDenied(path)) => Some(format!(
                "Grant the service read access to {}",
                path
            )),
            Self::Permission {
                missing_permissions,
                ..
            } => Some(format!(
                "Attach these permissions to the service credentials: {}",
                missing_permissions.join(", ")
            )),
            Self::NotFound { .. } => {
                Some("List deployments to find a valid identifier".to_string())
            }
            Self::Validation(err) => Some(format!("Fix the '{}' field and resubmit", err.field)),
            _ => None,
        }
    }
}

impl From<StoreError> for DeployError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound { id },
            other => Self::Deployment(other.to_string()),
        }
    }
}
