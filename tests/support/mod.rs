//! Shared fixtures for the integration tests

#![allow(dead_code)]

use deployhub::collaborators::{mock::MockCloud, Collaborators};
use deployhub::progress::NoOpHandler;
use deployhub::{DeployhubConfig, DeploymentPipeline};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const BASE_DOMAIN: &str = "apps.example.dev";

/// Writes a small React project with a prebuilt `dist/` under `root/name`
pub fn react_project(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::create_dir_all(dir.join("dist/static")).unwrap();

    fs::write(
        dir.join("package.json"),
        r#"{
  "name": "demo",
  "version": "1.0.0",
  "scripts": {
    "start": "react-scripts start",
    "build": "react-scripts build"
  },
  "dependencies": {
    "react": "^18.2.0",
    "react-dom": "^18.2.0"
  }
}
"#,
    )
    .unwrap();
    fs::write(
        dir.join("src/App.js"),
        "export default function App() { return <h1>Hello</h1>; }\n",
    )
    .unwrap();
    fs::write(
        dir.join("src/index.js"),
        "import App from './App';\n",
    )
    .unwrap();
    fs::write(dir.join("dist/index.html"), "<!doctype html><div id=root></div>\n").unwrap();
    fs::write(dir.join("dist/static/app.js"), "console.log('app');\n").unwrap();

    dir
}

/// Writes a plain static site under `root/name`
pub fn static_site(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("css")).unwrap();
    fs::write(dir.join("index.html"), "<html><body>hi</body></html>\n").unwrap();
    fs::write(dir.join("css/site.css"), "body { margin: 0; }\n").unwrap();
    dir
}

pub fn config(projects_dir: &Path) -> DeployhubConfig {
    DeployhubConfig {
        projects_dir: projects_dir.to_path_buf(),
        base_domain: BASE_DOMAIN.to_string(),
        namespace: "apps".to_string(),
        rollout_timeout_secs: 5,
        write_artifacts: true,
        ..DeployhubConfig::default()
    }
}

pub fn pipeline(mock: &Arc<MockCloud>, projects_dir: &Path) -> DeploymentPipeline {
    DeploymentPipeline::new(config(projects_dir), Collaborators::mock(mock.clone()))
        .with_progress_handler(Arc::new(NoOpHandler))
}
