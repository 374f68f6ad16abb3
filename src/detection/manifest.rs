//! Manifest parsing for the project root
//!
//! Every parser is pure over file contents. `load_manifests` reads whichever manifests
//! exist; a manifest that cannot be read or parsed is skipped with a warning so one
//! broken file does not hide the rest of the project.

use super::types::ManifestData;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parsed contents of a `package.json`
pub fn parse_package_json(content: &str) -> Result<ManifestData, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let mut data = ManifestData {
        name: value.get("name").and_then(|v| v.as_str()).map(String::from),
        version: value
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from),
        package_manager: Some("npm".to_string()),
        ..Default::default()
    };

    for table in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(table).and_then(|v| v.as_object()) {
            data.dependencies.extend(deps.keys().cloned());
        }
    }

    if let Some(scripts) = value.get("scripts").and_then(|v| v.as_object()) {
        for (name, command) in scripts {
            let command = command.as_str().unwrap_or_default().to_string();
            data.scripts.insert(name.clone(), command);
        }
    }

    Ok(data)
}

/// Package names from a `requirements.txt`, version specifiers and extras stripped
pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let end = line
                .find(|c: char| matches!(c, '=' | '<' | '>' | '~' | '!' | '[' | ';' | ' ' | '@'))
                .unwrap_or(line.len());
            let name = line[..end].trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Keys of the `[dependencies]` table of a `Cargo.toml`
pub fn parse_cargo_toml(content: &str) -> Result<ManifestData, toml::de::Error> {
    let value: toml::Value = toml::from_str(content)?;
    let package = value.get("package");
    let mut data = ManifestData {
        name: package
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str())
            .map(String::from),
        version: package
            .and_then(|p| p.get("version"))
            .and_then(|v| v.as_str())
            .map(String::from),
        package_manager: Some("cargo".to_string()),
        ..Default::default()
    };

    if let Some(deps) = value.get("dependencies").and_then(|v| v.as_table()) {
        data.dependencies.extend(deps.keys().cloned());
    }

    Ok(data)
}

/// Module paths from the `require` directives of a `go.mod`
pub fn parse_go_mod(content: &str) -> Vec<String> {
    let mut modules = Vec::new();
    let mut in_block = false;

    for line in content.lines().map(str::trim) {
        if in_block {
            if line.starts_with(')') {
                in_block = false;
            } else if let Some(module) = line.split_whitespace().next() {
                if !module.starts_with("//") {
                    modules.push(module.to_string());
                }
            }
        } else if line.starts_with("require (") || line == "require(" {
            in_block = true;
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(module) = rest.split_whitespace().next() {
                modules.push(module.to_string());
            }
        }
    }

    modules
}

/// `require` keys of a `composer.json`, platform entries (`php`, `ext-*`) skipped
pub fn parse_composer_json(content: &str) -> Result<ManifestData, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let mut data = ManifestData {
        name: value.get("name").and_then(|v| v.as_str()).map(String::from),
        version: value
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from),
        package_manager: Some("composer".to_string()),
        ..Default::default()
    };

    if let Some(require) = value.get("require").and_then(|v| v.as_object()) {
        data.dependencies.extend(
            require
                .keys()
                .filter(|k| k.as_str() != "php" && !k.starts_with("ext-"))
                .cloned(),
        );
    }

    Ok(data)
}

fn read(root: &Path, name: &str) -> Option<String> {
    let path = root.join(name);
    if !path.is_file() {
        return None;
    }
    match fs::read_to_string(&path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to read manifest");
            None
        }
    }
}

fn merge(target: &mut ManifestData, source: ManifestData) {
    if target.name.is_none() {
        target.name = source.name;
    }
    if target.version.is_none() {
        target.version = source.version;
    }
    target.dependencies.extend(source.dependencies);
    target.scripts.extend(source.scripts);
    if source.package_manager.is_some() {
        target.package_manager = source.package_manager;
    }
}

/// Reads every recognized manifest at `root`
///
/// Dependencies accumulate in the order package.json, requirements.txt, Cargo.toml,
/// go.mod, composer.json. The package manager of the last manifest found wins.
pub fn load_manifests(root: &Path) -> ManifestData {
    let mut data = ManifestData::default();

    if let Some(content) = read(root, "package.json") {
        match parse_package_json(&content) {
            Ok(mut parsed) => {
                if root.join("yarn.lock").is_file() {
                    parsed.package_manager = Some("yarn".to_string());
                } else if root.join("pnpm-lock.yaml").is_file() {
                    parsed.package_manager = Some("pnpm".to_string());
                }
                merge(&mut data, parsed);
            }
            Err(e) => warn!(error = %e, "Failed to parse package.json"),
        }
    }

    if let Some(content) = read(root, "requirements.txt") {
        merge(
            &mut data,
            ManifestData {
                dependencies: parse_requirements(&content),
                package_manager: Some("pip".to_string()),
                ..Default::default()
            },
        );
    }

    if let Some(content) = read(root, "Cargo.toml") {
        match parse_cargo_toml(&content) {
            Ok(parsed) => merge(&mut data, parsed),
            Err(e) => warn!(error = %e, "Failed to parse Cargo.toml"),
        }
    }

    if let Some(content) = read(root, "go.mod") {
        merge(
            &mut data,
            ManifestData {
                dependencies: parse_go_mod(&content),
                package_manager: Some("go".to_string()),
                ..Default::default()
            },
        );
    }

    if let Some(content) = read(root, "composer.json") {
        match parse_composer_json(&content) {
            Ok(parsed) => merge(&mut data, parsed),
            Err(e) => warn!(error = %e, "Failed to parse composer.json"),
        }
    }

    if data.package_manager.is_none() {
        if root.join("pom.xml").is_file() {
            data.package_manager = Some("maven".to_string());
        } else if root.join("build.gradle").is_file() {
            data.package_manager = Some("gradle".to_string());
        }
    }

    debug!(
        dependencies = data.dependencies.len(),
        scripts = data.scripts.len(),
        package_manager = ?data.package_manager,
        "Loaded manifests"
    );

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_json_keeps_source_order() {
        let data = parse_package_json(
            r#"{
                "name": "shop",
                "version": "1.2.0",
                "scripts": {"start": "react-scripts start", "build": "react-scripts build"},
                "dependencies": {"react-dom": "^18", "react": "^18", "axios": "^1"},
                "devDependencies": {"eslint": "^8"}
            }"#,
        )
        .unwrap();

        assert_eq!(data.name.as_deref(), Some("shop"));
        assert_eq!(data.version.as_deref(), Some("1.2.0"));
        assert_eq!(data.dependencies, vec!["react-dom", "react", "axios", "eslint"]);
        assert!(data.has_script("start"));
        assert!(data.has_script("build"));
        assert_eq!(data.package_manager.as_deref(), Some("npm"));
    }

    #[test]
    fn test_package_json_invalid() {
        assert!(parse_package_json("{ not json").is_err());
    }

    #[test]
    fn test_requirements_strip_specifiers() {
        let deps = parse_requirements(
            "# web\nFlask==2.3.0\nrequests>=2.0\n\nuvicorn[standard]~=0.23\n-r base.txt\ngunicorn\n",
        );
        assert_eq!(deps, vec!["Flask", "requests", "uvicorn", "gunicorn"]);
    }

    #[test]
    fn test_cargo_toml_dependencies() {
        let data = parse_cargo_toml(
            "[package]\nname = \"svc\"\nversion = \"0.1.0\"\n\n[dependencies]\nactix-web = \"4\"\nserde = { version = \"1\" }\n",
        )
        .unwrap();
        assert_eq!(data.name.as_deref(), Some("svc"));
        assert!(data.dependencies.contains(&"actix-web".to_string()));
        assert!(data.dependencies.contains(&"serde".to_string()));
    }

    #[test]
    fn test_go_mod_require_forms() {
        let deps = parse_go_mod(
            "module example.com/api\n\ngo 1.21\n\nrequire github.com/google/uuid v1.3.0\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\t// indirect below\n\tgolang.org/x/net v0.17.0 // indirect\n)\n",
        );
        assert_eq!(
            deps,
            vec![
                "github.com/google/uuid",
                "github.com/gin-gonic/gin",
                "golang.org/x/net"
            ]
        );
    }

    #[test]
    fn test_composer_skips_platform_requirements() {
        let data = parse_composer_json(
            r#"{"require": {"php": "^8.2", "ext-json": "*", "laravel/framework": "^10.0"}}"#,
        )
        .unwrap();
        assert_eq!(data.dependencies, vec!["laravel/framework"]);
    }

    #[test]
    fn test_load_manifests_combines_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react": "18"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        fs::write(dir.path().join("requirements.txt"), "fastapi\n").unwrap();

        let data = load_manifests(dir.path());
        assert_eq!(data.dependencies, vec!["react", "fastapi"]);
        assert_eq!(data.package_manager.as_deref(), Some("pip"));
    }

    #[test]
    fn test_load_manifests_skips_broken_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{ broken").unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();

        let data = load_manifests(dir.path());
        assert!(data.dependencies.is_empty());
        assert_eq!(data.package_manager.as_deref(), Some("maven"));
    }
}
