use super::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const HTML_CACHE_CONTROL: &str = "public, max-age=0, must-revalidate";
pub const ASSET_CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: String,
    pub domain_name: String,
    pub status: String,
}

/// Object storage plus CDN for static output
#[async_trait]
pub trait CloudHostingClient: Send + Sync {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), CollaboratorError>;

    /// Website hosting with `index.html` as index and error document
    async fn configure_website(&self, bucket: &str) -> Result<(), CollaboratorError>;

    async fn set_public_read_policy(&self, bucket: &str) -> Result<(), CollaboratorError>;

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), CollaboratorError>;

    async fn create_distribution(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<Distribution, CollaboratorError>;

    async fn get_distribution(&self, id: &str) -> Result<Distribution, CollaboratorError>;

    async fn delete_distribution(&self, id: &str) -> Result<(), CollaboratorError>;

    async fn delete_bucket(&self, bucket: &str) -> Result<(), CollaboratorError>;
}

/// MIME type served for an uploaded file, by extension
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// HTML must revalidate so new releases show up; everything else is fingerprinted
pub fn cache_control_for(path: &str) -> &'static str {
    if content_type_for(path).starts_with("text/html") {
        HTML_CACHE_CONTROL
    } else {
        ASSET_CACHE_CONTROL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        html = { "index.html", "text/html; charset=utf-8" },
        nested_css = { "static/css/main.css", "text/css; charset=utf-8" },
        js = { "assets/app.js", "application/javascript; charset=utf-8" },
        json = { "manifest.json", "application/json; charset=utf-8" },
        upper_png = { "logo.PNG", "image/png" },
        jpeg = { "photo.jpeg", "image/jpeg" },
        svg = { "icon.svg", "image/svg+xml" },
        favicon = { "favicon.ico", "image/x-icon" },
        font = { "fonts/inter.woff2", "font/woff2" },
        unknown = { "data.bin", "application/octet-stream" },
        no_extension = { "LICENSE", "application/octet-stream" },
    )]
    fn test_content_type_for(path: &str, expected: &str) {
        assert_eq!(content_type_for(path), expected);
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(cache_control_for("index.html"), HTML_CACHE_CONTROL);
        assert_eq!(cache_control_for("main.4f2a.js"), ASSET_CACHE_CONTROL);
        assert_eq!(cache_control_for("blob"), ASSET_CACHE_CONTROL);
    }
}
