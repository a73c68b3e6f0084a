//! Static SIP+ assessment schema: five standards, each an ordered list of pages.
//!
//! The schema ships as `assets/standards.json`, embedded at compile time and
//! parsed once at startup into an immutable [`SchemaRegistry`].

use std::collections::{HashMap, HashSet};

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{section_key, LocalSection, StandardCode};

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

const SCHEMA_FILE: &str = "standards.json";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema asset '{0}' is missing")]
    MissingAsset(&'static str),
    #[error("schema parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("page '{page}' is listed under standard {standard}")]
    MisplacedPage { standard: StandardCode, page: String },
    #[error("duplicate page code '{0}'")]
    DuplicatePage(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreeTextBlock {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckBlock {
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default)]
    pub checkboxes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSchema {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(rename = "do", default)]
    pub do_block: FreeTextBlock,
    #[serde(default)]
    pub check: CheckBlock,
    #[serde(default)]
    pub act: FreeTextBlock,
    #[serde(default)]
    pub evidence_labels: Vec<String>,
}

impl PageSchema {
    /// Index of the free-text "Lain - lain" evidence label, if the page has one.
    pub fn other_evidence_index(&self) -> Option<usize> {
        self.evidence_labels.iter().position(|label| {
            let compact: String = label.chars().filter(|c| c.is_alphanumeric()).collect();
            compact.eq_ignore_ascii_case("lainlain")
        })
    }
}

/// Numeric page suffix ("3.1-4" -> 4) used to order pages within a standard.
pub fn page_ordinal(page_code: &str) -> Option<u32> {
    page_code.rsplit('-').next()?.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardSchema {
    pub code: StandardCode,
    pub pages: Vec<PageSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    standards: Vec<StandardSchema>,
}

impl SchemaRegistry {
    /// Registry built from the embedded `standards.json` asset.
    pub fn builtin() -> Result<Self, SchemaError> {
        let raw = ASSETS
            .get_file(SCHEMA_FILE)
            .and_then(|f| f.contents_utf8())
            .ok_or(SchemaError::MissingAsset(SCHEMA_FILE))?;
        Self::from_json(raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let mut registry: SchemaRegistry = serde_json::from_str(raw)?;
        registry.standards.sort_by_key(|s| s.code);
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for standard in &self.standards {
            for page in &standard.pages {
                let prefix = page.code.split('-').next().unwrap_or_default();
                if prefix != standard.code.as_str() {
                    return Err(SchemaError::MisplacedPage { standard: standard.code, page: page.code.clone() });
                }
                if !seen.insert(page.code.as_str()) {
                    return Err(SchemaError::DuplicatePage(page.code.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn standards(&self) -> &[StandardSchema] {
        &self.standards
    }

    pub fn standard(&self, code: StandardCode) -> Option<&StandardSchema> {
        self.standards.iter().find(|s| s.code == code)
    }

    /// Pages of a standard in schema order; empty when the standard is unknown.
    pub fn pages(&self, code: StandardCode) -> &[PageSchema] {
        self.standard(code).map(|s| s.pages.as_slice()).unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn page(&self, code: StandardCode, page_code: &str) -> Option<&PageSchema> {
        self.pages(code).iter().find(|p| p.code == page_code)
    }

    /// Form-init state: one empty section for every page of every standard.
    pub fn blank_sections(&self) -> HashMap<String, LocalSection> {
        self.standards
            .iter()
            .flat_map(|standard| {
                standard.pages.iter().map(move |page| {
                    (
                        section_key(standard.code, &page.code),
                        LocalSection::blank(page.check.checkboxes.len(), page.evidence_labels.len()),
                    )
                })
            })
            .collect()
    }
}
