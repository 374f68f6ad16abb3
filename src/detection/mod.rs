//! Project type detection
//!
//! [`ProjectAnalyzer`] walks an uploaded tree, reads its manifests and scores every
//! catalog row with [`detector::detect`]. The winning type is folded together with the
//! containerization plan into a [`ProjectProfile`].

pub mod analyzer;
pub mod catalog;
pub mod detector;
pub mod manifest;
pub mod profile;
pub mod types;

pub use analyzer::{AnalysisError, AnalyzerConfig, ProjectAnalyzer};
pub use detector::{detect, Detection};
pub use types::{HealthCheck, ManifestData, ProjectProfile, ProjectType};
