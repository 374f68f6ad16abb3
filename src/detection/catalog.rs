//! Signature catalog used by the scorer

use super::types::ProjectType;

/// What a project of a given type usually contains
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub project_type: ProjectType,
    /// Matched by substring against relative file paths; `dir/` entries match anything inside
    pub files: &'static [&'static str],
    /// Matched by case-insensitive substring against dependency names
    pub keywords: &'static [&'static str],
    /// Matched exactly against the manifest script table
    pub scripts: &'static [&'static str],
}

pub const CATALOG: [Signature; 12] = [
    Signature {
        project_type: ProjectType::React,
        files: &["package.json", "src/App.js", "src/App.jsx", "src/index.js"],
        keywords: &["react", "react-dom"],
        scripts: &["start", "build"],
    },
    Signature {
        project_type: ProjectType::Vue,
        files: &["package.json", "src/App.vue", "src/main.js"],
        keywords: &["vue", "@vue/cli"],
        scripts: &["serve", "build"],
    },
    Signature {
        project_type: ProjectType::Angular,
        files: &["package.json", "src/app/app.component.ts", "angular.json"],
        keywords: &["@angular/core", "@angular/cli"],
        scripts: &["start", "build"],
    },
    Signature {
        project_type: ProjectType::Nextjs,
        files: &["package.json", "next.config.js", "pages/", "app/"],
        keywords: &["next", "react"],
        scripts: &["dev", "build", "start"],
    },
    Signature {
        project_type: ProjectType::Nuxt,
        files: &["package.json", "nuxt.config.js", "pages/"],
        keywords: &["nuxt", "vue"],
        scripts: &["dev", "build", "start"],
    },
    Signature {
        project_type: ProjectType::Svelte,
        files: &["package.json", "src/App.svelte", "svelte.config.js"],
        keywords: &["svelte", "sveltekit"],
        scripts: &["dev", "build"],
    },
    Signature {
        project_type: ProjectType::Python,
        files: &["requirements.txt", "main.py", "app.py", "manage.py"],
        keywords: &["flask", "django", "fastapi", "streamlit"],
        scripts: &[],
    },
    Signature {
        project_type: ProjectType::Java,
        files: &["pom.xml", "build.gradle", "src/main/java/"],
        keywords: &["spring", "maven", "gradle"],
        scripts: &[],
    },
    Signature {
        project_type: ProjectType::Go,
        files: &["go.mod", "main.go", "go.sum"],
        keywords: &["gin", "echo", "fiber"],
        scripts: &[],
    },
    Signature {
        project_type: ProjectType::Rust,
        files: &["Cargo.toml", "src/main.rs"],
        keywords: &["actix", "warp", "rocket"],
        scripts: &[],
    },
    Signature {
        project_type: ProjectType::Php,
        files: &["composer.json", "index.php", "public/"],
        keywords: &["laravel", "symfony", "wordpress"],
        scripts: &[],
    },
    Signature {
        project_type: ProjectType::Static,
        files: &["index.html", "css/", "js/", "assets/"],
        keywords: &[],
        scripts: &[],
    },
];

/// Catalog row for a type; `unknown` resolves to the static row
pub fn signature_for(project_type: ProjectType) -> &'static Signature {
    CATALOG
        .iter()
        .find(|sig| sig.project_type == project_type)
        .unwrap_or(&CATALOG[CATALOG.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_follows_scoring_order() {
        let order: Vec<ProjectType> = CATALOG.iter().map(|s| s.project_type).collect();
        assert_eq!(order, ProjectType::CATALOG_ORDER.to_vec());
    }

    #[test]
    fn test_every_row_has_file_signatures() {
        for sig in CATALOG.iter() {
            assert!(!sig.files.is_empty(), "{} has no files", sig.project_type);
        }
    }

    #[test]
    fn test_unknown_resolves_to_static() {
        assert_eq!(
            signature_for(ProjectType::Unknown).project_type,
            ProjectType::Static
        );
        assert_eq!(signature_for(ProjectType::Go).files[0], "go.mod");
    }
}
