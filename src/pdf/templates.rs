//! Official borang templates: where they live and where fields are stamped.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::fetch::HttpFetcher;
use crate::models::StandardCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

const fn pt(x: f32, y: f32) -> Point {
    Point { x, y }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemarksBox {
    pub x: f32,
    pub y: f32,
    pub max_width: f32,
    pub line_height: f32,
}

/// Fixed stamping positions on a standard's template page.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardCoordinates {
    pub score: Option<Point>,
    /// Index `i` is the checkbox for evidence answer `i`.
    pub evidences: &'static [Point],
    pub remarks: Option<RemarksBox>,
}

pub const SCHOOL_NAME_AT: Point = pt(65.0, 740.0);
pub const VISIT_DATE_AT: Point = pt(420.0, 740.0);
pub const FIELD_FONT_SIZE: f32 = 10.0;
pub const EVIDENCE_MARK_SIZE: f32 = 8.0;

const SCORE_AT: Point = pt(560.0, 612.0);
const REMARKS_BOX: RemarksBox = RemarksBox { x: 60.0, y: 250.0, max_width: 500.0, line_height: 12.0 };

// Two columns of evidence checkboxes on the standard 1 borang.
const KEPIMPINAN_EVIDENCES: [Point; 11] = [
    pt(40.0, 360.0),
    pt(40.0, 342.0),
    pt(40.0, 324.0),
    pt(40.0, 306.0),
    pt(40.0, 288.0),
    pt(40.0, 270.0),
    pt(460.0, 360.0),
    pt(460.0, 342.0),
    pt(460.0, 324.0),
    pt(460.0, 306.0),
    pt(460.0, 288.0),
];

pub fn coordinates(code: StandardCode) -> StandardCoordinates {
    let evidences: &'static [Point] = match code {
        StandardCode::Kepimpinan => &KEPIMPINAN_EVIDENCES,
        _ => &[],
    };
    StandardCoordinates { score: Some(SCORE_AT), evidences, remarks: Some(REMARKS_BOX) }
}

/// Template used for a standard's borang page.
pub fn template_path(code: StandardCode) -> String {
    format!("/standard {}/{}-2.pdf", code, code)
}

/// Per-page template layout: `"3.1-4"` lives at `/standard 3.1/3.1-4.pdf`.
pub fn page_template_path(page_code: &str) -> Option<String> {
    let (standard, _) = page_code.split_once('-')?;
    let standard: StandardCode = standard.parse().ok()?;
    Some(format!("/standard {}/{}.pdf", standard, page_code))
}

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Raw bytes of the template at `path` (e.g. `/standard 1/1-2.pdf`).
    async fn fetch(&self, path: &str) -> Result<Bytes, ReportError>;
}

#[derive(Default)]
struct TemplateCache {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl TemplateCache {
    fn get(&self, path: &str) -> Option<Bytes> {
        self.entries.read().get(path).cloned()
    }

    fn put(&self, path: &str, bytes: Bytes) {
        self.entries.write().insert(path.to_string(), bytes);
    }
}

/// Templates read from a local directory (`TEMPLATE_DIR`).
pub struct DirTemplates {
    root: PathBuf,
    cache: TemplateCache,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: TemplateCache::default() }
    }
}

#[async_trait]
impl TemplateSource for DirTemplates {
    async fn fetch(&self, path: &str) -> Result<Bytes, ReportError> {
        if let Some(bytes) = self.cache.get(path) {
            return Ok(bytes);
        }
        let relative = path.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return Err(ReportError::TemplateNotFound(path.to_string()));
        }
        let full = self.root.join(relative);
        let bytes = tokio::fs::read(&full).await.map_err(|e| {
            warn!("⚠️ Template {} unreadable at {}: {}", path, full.display(), e);
            ReportError::TemplateNotFound(path.to_string())
        })?;
        info!("📄 Loaded template {} ({} bytes)", path, bytes.len());
        let bytes = Bytes::from(bytes);
        self.cache.put(path, bytes.clone());
        Ok(bytes)
    }
}

/// Templates served over HTTP under a base URL (`TEMPLATE_BASE_URL`).
pub struct HttpTemplates {
    base_url: String,
    http: HttpFetcher,
    cache: TemplateCache,
}

impl HttpTemplates {
    pub fn new(base_url: impl Into<String>, http: HttpFetcher) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), http, cache: TemplateCache::default() }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/').replace(' ', "%20"))
    }
}

#[async_trait]
impl TemplateSource for HttpTemplates {
    async fn fetch(&self, path: &str) -> Result<Bytes, ReportError> {
        if let Some(bytes) = self.cache.get(path) {
            return Ok(bytes);
        }
        let url = self.url_for(path);
        let fetched = self.http.get(&url).await.map_err(|e| {
            warn!("⚠️ Template {} unavailable: {}", path, e);
            ReportError::TemplateNotFound(path.to_string())
        })?;
        self.cache.put(path, fetched.bytes.clone());
        Ok(fetched.bytes)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn template_paths_follow_folder_layout() {
        assert_eq!(template_path(StandardCode::Kepimpinan), "/standard 1/1-2.pdf");
        assert_eq!(template_path(StandardCode::Kurikulum), "/standard 3.1/3.1-2.pdf");
        assert_eq!(template_path(StandardCode::HalEhwalMurid), "/standard 3.3/3.3-2.pdf");
        assert_eq!(page_template_path("3.2-6").as_deref(), Some("/standard 3.2/3.2-6.pdf"));
        assert_eq!(page_template_path("2-10").as_deref(), Some("/standard 2/2-10.pdf"));
        assert_eq!(page_template_path("7-1"), None);
    }

    #[test]
    fn only_standard_one_has_evidence_boxes() {
        let first = coordinates(StandardCode::Kepimpinan);
        assert_eq!(first.evidences.len(), 11);
        assert_eq!(first.evidences[6], Point { x: 460.0, y: 360.0 });
        for code in &StandardCode::ALL[1..] {
            let coords = coordinates(*code);
            assert!(coords.evidences.is_empty());
            assert_eq!(coords.score, Some(Point { x: 560.0, y: 612.0 }));
            assert_eq!(coords.remarks.map(|r| r.max_width), Some(500.0));
        }
    }

    #[tokio::test]
    async fn dir_templates_read_and_cache() {
        let root = std::env::temp_dir().join(format!("sip-templates-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("standard 2")).unwrap();
        std::fs::write(root.join("standard 2/2-2.pdf"), b"%PDF-1.5 fake").unwrap();

        let templates = DirTemplates::new(&root);
        let first = templates.fetch("/standard 2/2-2.pdf").await.unwrap();
        assert_eq!(&first[..], b"%PDF-1.5 fake");

        std::fs::remove_dir_all(&root).unwrap();
        let cached = templates.fetch("/standard 2/2-2.pdf").await.unwrap();
        assert_eq!(cached, first);
    }

    #[tokio::test]
    async fn missing_templates_name_the_path() {
        let templates = DirTemplates::new(std::env::temp_dir().join("sip-templates-missing"));
        let err = templates.fetch("/standard 3.1/3.1-2.pdf").await.unwrap_err();
        assert_eq!(err.to_string(), "Template not found: /standard 3.1/3.1-2.pdf");

        let err = templates.fetch("/../etc/passwd").await.unwrap_err();
        assert!(matches!(err, ReportError::TemplateNotFound(_)));
    }

    #[test]
    fn http_template_urls_escape_spaces() {
        let http = HttpFetcher::new(std::time::Duration::from_secs(1), 0).unwrap();
        let templates = HttpTemplates::new("https://sip.example/", http);
        assert_eq!(templates.url_for("/standard 3.1/3.1-2.pdf"), "https://sip.example/standard%203.1/3.1-2.pdf");
    }
}
