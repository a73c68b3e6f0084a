use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use uuid::Uuid;

/// One of the five SIP+ standards. Serialized as the official code ("1", "3.2", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardCode {
    #[serde(rename = "1")]
    Kepimpinan,
    #[serde(rename = "2")]
    PengurusanOrganisasi,
    #[serde(rename = "3.1")]
    Kurikulum,
    #[serde(rename = "3.2")]
    Kokurikulum,
    #[serde(rename = "3.3")]
    HalEhwalMurid,
}

impl StandardCode {
    pub const ALL: [StandardCode; 5] = [
        StandardCode::Kepimpinan,
        StandardCode::PengurusanOrganisasi,
        StandardCode::Kurikulum,
        StandardCode::Kokurikulum,
        StandardCode::HalEhwalMurid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StandardCode::Kepimpinan => "1",
            StandardCode::PengurusanOrganisasi => "2",
            StandardCode::Kurikulum => "3.1",
            StandardCode::Kokurikulum => "3.2",
            StandardCode::HalEhwalMurid => "3.3",
        }
    }
}

impl fmt::Display for StandardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStandard(pub String);

impl fmt::Display for UnknownStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown standard code '{}'", self.0)
    }
}

impl std::error::Error for UnknownStandard {}

impl FromStr for StandardCode {
    type Err = UnknownStandard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StandardCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s.trim())
            .ok_or_else(|| UnknownStandard(s.to_string()))
    }
}

/// Key of a page's form state: `"{standard}-{page_code}"`, e.g. `"3.1-3.1-4"`.
pub fn section_key(standard: StandardCode, page_code: &str) -> String {
    format!("{}-{}", standard, page_code)
}

/// Inverse of [`section_key`]. Returns `None` for keys whose prefix is not a standard.
pub fn parse_section_key(key: &str) -> Option<(StandardCode, &str)> {
    let (standard, page_code) = key.split_once('-')?;
    let standard = standard.parse().ok()?;
    if page_code.is_empty() {
        return None;
    }
    Some((standard, page_code))
}

/// Runtime form state of one assessment page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSection {
    #[serde(default)]
    pub score: Option<u32>,
    /// Aligned with the page's CHECK checkbox options.
    #[serde(default)]
    pub check_answers: Vec<bool>,
    /// Aligned with the page's EVIDENCE labels.
    #[serde(default)]
    pub evidence_answers: Vec<bool>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub do_text: Option<String>,
    #[serde(default)]
    pub act_text: Option<String>,
    #[serde(default)]
    pub lain_lain_text: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl LocalSection {
    /// Empty state for a page with the given checkbox and evidence counts.
    pub fn blank(check_len: usize, evidence_len: usize) -> Self {
        Self {
            check_answers: vec![false; check_len],
            evidence_answers: vec![false; evidence_len],
            ..Default::default()
        }
    }

    pub fn has_content(&self) -> bool {
        self.score.is_some()
            || non_blank(&self.remarks).is_some()
            || non_blank(&self.do_text).is_some()
            || non_blank(&self.act_text).is_some()
            || non_blank(&self.lain_lain_text).is_some()
            || self.check_answers.iter().any(|b| *b)
            || self.evidence_answers.iter().any(|b| *b)
    }

    pub fn remarks_text(&self) -> Option<&str> {
        non_blank(&self.remarks)
    }
}

/// Standard-level roll-up stamped onto the official borang.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardSummary {
    pub code: StandardCode,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub evidences: Vec<bool>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl StandardSummary {
    pub fn has_data(&self) -> bool {
        self.score.is_some() || non_blank(&self.remarks).is_some() || self.evidences.iter().any(|b| *b)
    }

    pub fn remarks_text(&self) -> Option<&str> {
        non_blank(&self.remarks)
    }
}

/// Page-level row rendered by the narrative report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInput {
    pub standard_code: StandardCode,
    pub page_code: String,
    pub title: String,
    pub plan: Vec<String>,
    pub do_text: String,
    pub act_text: String,
    pub checklist_labels: Vec<String>,
    pub checklist_checked: Vec<bool>,
    pub evidence_labels: Vec<String>,
    pub evidence_checked: Vec<bool>,
    pub score: Option<u32>,
    pub remarks: String,
    pub lain_lain_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitImage {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section_code: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl VisitImage {
    /// Caption shown under the image: the description, else the uploaded file name.
    pub fn caption(&self) -> &str {
        non_blank(&self.description).unwrap_or(&self.original_name)
    }

    pub fn standard(&self) -> Option<StandardCode> {
        self.section_code.as_deref().and_then(|c| c.parse().ok())
    }
}

/// Builds public object URLs for uploaded visit images.
#[derive(Debug, Clone)]
pub struct PublicUrlResolver {
    base: String,
}

impl PublicUrlResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into().trim_end_matches('/').to_string() }
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.base, filename.trim_start_matches('/'))
    }

    /// Fills `public_url` on images that do not carry one yet.
    pub fn resolve(&self, images: &mut [VisitImage]) {
        for image in images.iter_mut().filter(|i| i.public_url.is_none()) {
            image.public_url = Some(self.url_for(&image.filename));
        }
    }
}

/// Stored per-page row (`visit_pages`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRow {
    pub visit_id: Uuid,
    pub standard_code: StandardCode,
    pub page_code: String,
    #[serde(default)]
    pub data: LocalSection,
}

/// Stored standard-level row (`visit_sections`).
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub visit_id: Uuid,
    pub section_code: StandardCode,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub evidences: Vec<bool>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl From<SummaryRow> for StandardSummary {
    fn from(row: SummaryRow) -> Self {
        StandardSummary {
            code: row.section_code,
            score: row.score,
            evidences: row.evidences,
            remarks: row.remarks,
        }
    }
}

/// Rebuilds the keyed form state from stored page rows. Later rows win.
pub fn local_sections_from_rows(rows: impl IntoIterator<Item = PageRow>) -> HashMap<String, LocalSection> {
    rows.into_iter()
        .map(|row| (section_key(row.standard_code, &row.page_code), row.data))
        .collect()
}
