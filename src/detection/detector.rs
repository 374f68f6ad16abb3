//! Weighted signature scoring
//!
//! Each catalog row is scored from three ratios: signature files present, dependency
//! keywords present, expected scripts present. The best row wins unless it scores under
//! [`CONFIDENCE_FLOOR`], in which case the project is treated as a static site with the
//! floor as its confidence.

use super::catalog::{Signature, CATALOG};
use super::types::{ManifestData, ProjectType};
use serde::Serialize;
use tracing::debug;

pub const FILE_WEIGHT: f64 = 0.4;
pub const KEYWORD_WEIGHT: f64 = 0.4;
pub const SCRIPT_WEIGHT: f64 = 0.2;
pub const CONFIDENCE_FLOOR: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub project_type: ProjectType,
    pub confidence: f64,
}

fn ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

/// Score of one catalog row, in [0, 1]
pub fn score(signature: &Signature, files: &[String], manifest: &ManifestData) -> f64 {
    let file_matches = signature
        .files
        .iter()
        .filter(|pattern| files.iter().any(|f| f.contains(*pattern)))
        .count();

    let lowered: Vec<String> = manifest
        .dependencies
        .iter()
        .map(|d| d.to_lowercase())
        .collect();
    let keyword_matches = signature
        .keywords
        .iter()
        .filter(|keyword| lowered.iter().any(|dep| dep.contains(*keyword)))
        .count();

    let script_matches = signature
        .scripts
        .iter()
        .filter(|script| manifest.has_script(script))
        .count();

    let total = ratio(file_matches, signature.files.len()) * FILE_WEIGHT
        + ratio(keyword_matches, signature.keywords.len()) * KEYWORD_WEIGHT
        + ratio(script_matches, signature.scripts.len()) * SCRIPT_WEIGHT;

    total.clamp(0.0, 1.0)
}

/// Classifies a project from its file listing and manifest data
pub fn detect(files: &[String], manifest: &ManifestData) -> Detection {
    let mut best = Detection {
        project_type: CATALOG[0].project_type,
        confidence: f64::MIN,
    };

    for signature in CATALOG.iter() {
        let value = score(signature, files, manifest);
        debug!(project_type = %signature.project_type, score = value, "Scored catalog row");
        if value > best.confidence {
            best = Detection {
                project_type: signature.project_type,
                confidence: value,
            };
        }
    }

    if best.confidence < CONFIDENCE_FLOOR {
        return Detection {
            project_type: ProjectType::Static,
            confidence: CONFIDENCE_FLOOR,
        };
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn manifest(deps: &[&str], scripts: &[&str]) -> ManifestData {
        ManifestData {
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            scripts: scripts
                .iter()
                .map(|s| (s.to_string(), format!("run {}", s)))
                .collect(),
            ..Default::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_react_example_scores_point_nine() {
        let result = detect(
            &files(&["package.json", "src/App.js", "src/index.js"]),
            &manifest(&["react", "react-dom"], &["start", "build"]),
        );
        assert_eq!(result.project_type, ProjectType::React);
        assert!(approx(result.confidence, 0.9), "got {}", result.confidence);
    }

    #[test]
    fn test_nothing_matches_gives_static_floor() {
        let result = detect(&files(&["notes.md", "LICENSE"]), &ManifestData::default());
        assert_eq!(result.project_type, ProjectType::Static);
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn test_weak_match_is_floored_not_kept() {
        // 1 of 4 react files -> 0.1
        let result = detect(&files(&["package.json"]), &ManifestData::default());
        assert_eq!(result.project_type, ProjectType::Static);
        assert_eq!(result.confidence, CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_full_match_reaches_one() {
        let result = detect(
            &files(&["Cargo.toml", "src/main.rs"]),
            &manifest(&["actix-web", "warp", "rocket"], &[]),
        );
        assert_eq!(result.project_type, ProjectType::Rust);
        assert!(approx(result.confidence, 0.8));

        let result = detect(
            &files(&["package.json", "src/App.js", "src/App.jsx", "src/index.js"]),
            &manifest(&["react", "react-dom"], &["start", "build"]),
        );
        assert!(approx(result.confidence, 1.0));
    }

    #[test]
    fn test_tie_goes_to_earlier_catalog_entry() {
        // package.json alone, plus "react": react scores 0.1 + 0.2, nextjs 0.1 + 0.2
        let m = manifest(&["react"], &[]);
        let f = files(&["package.json"]);
        let react = score(&CATALOG[0], &f, &m);
        let nextjs = score(&CATALOG[3], &f, &m);
        assert!(approx(react, nextjs));
        let result = detect(&f, &m);
        assert_eq!(result.project_type, ProjectType::React);
    }

    #[test]
    fn test_detection_is_reproducible() {
        let f = files(&["requirements.txt", "app.py"]);
        let m = manifest(&["Flask", "gunicorn"], &[]);
        assert_eq!(detect(&f, &m), detect(&f, &m));
    }

    #[test]
    fn test_keywords_match_case_insensitively() {
        let m = manifest(&["Django"], &[]);
        let value = score(&CATALOG[6], &[], &m);
        assert!(approx(value, 0.1));
    }

    #[test]
    fn test_directory_signatures_match_nested_files() {
        let f = files(&["pages/index.js"]);
        let value = score(&CATALOG[4], &f, &ManifestData::default());
        assert!(approx(value, 0.4 / 3.0));
    }

    #[parameterized(
        python = { &["requirements.txt", "main.py", "app.py"], &["fastapi", "uvicorn"], ProjectType::Python },
        go = { &["go.mod", "go.sum", "main.go"], &["github.com/gin-gonic/gin"], ProjectType::Go },
        php = { &["composer.json", "index.php", "public/index.php"], &["laravel/framework"], ProjectType::Php },
        java = { &["pom.xml", "src/main/java/App.java"], &["org.springframework.boot"], ProjectType::Java },
        static_site = { &["index.html", "css/site.css", "js/app.js"], &[], ProjectType::Static },
    )]
    fn test_ecosystem_detection(paths: &[&str], deps: &[&str], expected: ProjectType) {
        let result = detect(&files(paths), &manifest(deps, &[]));
        assert_eq!(result.project_type, expected);
        assert!(result.confidence >= CONFIDENCE_FLOOR && result.confidence <= 1.0);
    }
}
