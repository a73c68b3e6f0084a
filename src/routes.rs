use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};

use crate::{
    aggregate::{aggregate_for_narrative, aggregate_for_overlay},
    error::ReportError,
    models::{local_sections_from_rows, LocalSection, PageRow, PublicUrlResolver, SectionInput, StandardCode, StandardSummary, SummaryRow, VisitImage},
    pdf::{generate_narrative, generate_overlay, templates, ImageEmbedder, NarrativeRequest, OverlayRequest, TemplateSource},
    standards::SchemaRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub templates: Arc<dyn TemplateSource>,
    pub images: Arc<ImageEmbedder>,
    pub resolver: Option<PublicUrlResolver>,
}

impl AppState {
    fn resolve_images(&self, mut images: Vec<VisitImage>) -> Vec<VisitImage> {
        if let Some(resolver) = &self.resolver {
            resolver.resolve(&mut images);
        }
        images
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/standards", get(list_standards))
        .route("/api/templates", get(list_templates))
        .route("/api/sections/blank", get(blank_sections))
        .route("/api/sections/aggregate", post(aggregate_sections))
        .route("/api/reports/borang", post(export_borang))
        .route("/api/reports/narrative", post(export_narrative))
        .with_state(state)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_standards(State(state): State<AppState>) -> Json<SchemaRegistry> {
    Json(state.registry.as_ref().clone())
}

#[derive(Serialize)]
pub struct TemplateEntry {
    pub standard: StandardCode,
    pub template: String,
    pub pages: Vec<String>,
}

/// Borang template used per standard plus the per-page template layout.
pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<TemplateEntry>> {
    let entries = state
        .registry
        .standards()
        .iter()
        .map(|standard| TemplateEntry {
            standard: standard.code,
            template: templates::template_path(standard.code),
            pages: standard.pages.iter().filter_map(|p| templates::page_template_path(&p.code)).collect(),
        })
        .collect();
    Json(entries)
}

pub async fn blank_sections(State(state): State<AppState>) -> Json<HashMap<String, LocalSection>> {
    Json(state.registry.blank_sections())
}

#[derive(Deserialize)]
pub struct AggregateRequest {
    pub local_sections: HashMap<String, LocalSection>,
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub summaries: Vec<StandardSummary>,
    pub sections: Vec<SectionInput>,
}

pub async fn aggregate_sections(State(state): State<AppState>, Json(body): Json<AggregateRequest>) -> Json<AggregateResponse> {
    let summaries = aggregate_for_overlay(&body.local_sections);
    let sections = aggregate_for_narrative(&body.local_sections, &state.registry);
    tracing::info!("🧮 Aggregated {} keys into {} summaries / {} sections", body.local_sections.len(), summaries.len(), sections.len());
    Json(AggregateResponse { summaries, sections })
}

/// Form state as sent by the visit form, or as stored per page.
fn sections_from(local_sections: Option<HashMap<String, LocalSection>>, page_rows: Option<Vec<PageRow>>) -> Option<HashMap<String, LocalSection>> {
    local_sections.or_else(|| page_rows.map(local_sections_from_rows))
}

#[derive(Deserialize)]
pub struct BorangBody {
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub visit_date: String,
    #[serde(default)]
    pub local_sections: Option<HashMap<String, LocalSection>>,
    #[serde(default)]
    pub summary_rows: Option<Vec<SummaryRow>>,
    #[serde(default)]
    pub images: Vec<VisitImage>,
}

pub async fn export_borang(State(state): State<AppState>, Json(body): Json<BorangBody>) -> Result<Response, ReportError> {
    let sections = match (body.local_sections, body.summary_rows) {
        (Some(local), _) => aggregate_for_overlay(&local),
        (None, Some(rows)) => rows.into_iter().map(StandardSummary::from).collect(),
        (None, None) => return Err(ReportError::InvalidRequest("local_sections or summary_rows is required".into())),
    };

    tracing::info!("📋 Borang export for {} ({} standards with data)", body.school_name, sections.iter().filter(|s| s.has_data()).count());
    let request = OverlayRequest {
        school_name: body.school_name,
        visit_date: body.visit_date,
        sections,
        images: state.resolve_images(body.images),
    };
    let bytes = generate_overlay(&request, state.templates.as_ref(), &state.images).await?;
    Ok(pdf_response(bytes, &attachment_name("Borang_SIP", &request.school_name, &request.visit_date)))
}

#[derive(Deserialize)]
pub struct NarrativeBody {
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub visit_date: String,
    #[serde(default)]
    pub officer_name: Option<String>,
    #[serde(default)]
    pub pgb: Option<String>,
    #[serde(default)]
    pub sesi_bimbingan: Option<String>,
    #[serde(default)]
    pub local_sections: Option<HashMap<String, LocalSection>>,
    #[serde(default)]
    pub page_rows: Option<Vec<PageRow>>,
    #[serde(default)]
    pub images: Vec<VisitImage>,
}

pub async fn export_narrative(State(state): State<AppState>, Json(body): Json<NarrativeBody>) -> Result<Response, ReportError> {
    let local = sections_from(body.local_sections, body.page_rows).unwrap_or_default();
    let sections = aggregate_for_narrative(&local, &state.registry);

    tracing::info!("📝 Narrative report for {} ({} sections with content)", body.school_name, sections.len());
    let request = NarrativeRequest {
        school_name: body.school_name,
        visit_date: body.visit_date,
        officer_name: body.officer_name,
        pgb: body.pgb,
        sesi_bimbingan: body.sesi_bimbingan,
        sections,
        images: state.resolve_images(body.images),
    };
    let bytes = generate_narrative(&request, &state.images).await?;
    Ok(pdf_response(bytes, &attachment_name("Laporan_SIP", &request.school_name, &request.visit_date)))
}

fn attachment_name(prefix: &str, school_name: &str, visit_date: &str) -> String {
    let slug = |s: &str| -> String {
        s.trim().chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' }).collect()
    };
    let mut name = prefix.to_string();
    for part in [school_name, visit_date].into_iter().map(slug).filter(|p| !p.is_empty()) {
        name.push('_');
        name.push_str(&part);
    }
    format!("{}.pdf", name)
}

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        bytes,
    )
        .into_response()
}
