//! Turns keyed form state into the row shapes consumed by the two renderers.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::models::{parse_section_key, section_key, LocalSection, SectionInput, StandardCode, StandardSummary};
use crate::standards::{page_ordinal, SchemaRegistry};

/// Standard-level roll-up for the borang overlay.
///
/// Pages are visited in page-ordinal order within each standard. A standard is
/// emitted when at least one of its pages has content; the score is the maximum
/// page score, evidences are concatenated and remarks joined with `"; "`.
pub fn aggregate_for_overlay(sections: &HashMap<String, LocalSection>) -> Vec<StandardSummary> {
    let mut grouped: BTreeMap<StandardCode, Vec<(u32, &str, &LocalSection)>> = BTreeMap::new();
    for (key, section) in sections {
        let Some((standard, page_code)) = parse_section_key(key) else {
            debug!(key = %key, "skipping unrecognised section key");
            continue;
        };
        let ordinal = page_ordinal(page_code).unwrap_or(u32::MAX);
        grouped.entry(standard).or_default().push((ordinal, page_code, section));
    }

    grouped
        .into_iter()
        .filter_map(|(code, mut pages)| {
            if !pages.iter().any(|(_, _, s)| s.has_content()) {
                return None;
            }
            pages.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

            let score = pages.iter().filter_map(|(_, _, s)| s.score).max();
            let evidences = pages.iter().flat_map(|(_, _, s)| s.evidence_answers.iter().copied()).collect();
            let remarks: Vec<&str> = pages.iter().filter_map(|(_, _, s)| s.remarks_text()).collect();

            Some(StandardSummary {
                code,
                score,
                evidences,
                remarks: (!remarks.is_empty()).then(|| remarks.join("; ")),
            })
        })
        .collect()
}

/// Page-level rows for the narrative report, in schema order.
///
/// Every page of every standard is considered, not only the page currently open
/// in the form. Pages without content are dropped. Filled-in "Lain - lain" text
/// marks that evidence as present.
pub fn aggregate_for_narrative(sections: &HashMap<String, LocalSection>, registry: &SchemaRegistry) -> Vec<SectionInput> {
    let mut out = Vec::new();
    for standard in StandardCode::ALL {
        for page in registry.pages(standard) {
            let Some(section) = sections.get(&section_key(standard, &page.code)) else {
                continue;
            };
            if !section.has_content() {
                continue;
            }

            let mut evidence_checked = aligned(&section.evidence_answers, page.evidence_labels.len());
            let other_text = section.lain_lain_text.as_deref().map(str::trim).filter(|t| !t.is_empty());
            if let (Some(_), Some(i)) = (other_text, page.other_evidence_index()) {
                evidence_checked[i] = true;
            }

            out.push(SectionInput {
                standard_code: standard,
                page_code: page.code.clone(),
                title: page.title.clone(),
                plan: page.plan.clone(),
                do_text: section.do_text.clone().unwrap_or_default(),
                act_text: section.act_text.clone().unwrap_or_default(),
                checklist_labels: page.check.checkboxes.clone(),
                checklist_checked: aligned(&section.check_answers, page.check.checkboxes.len()),
                evidence_labels: page.evidence_labels.clone(),
                evidence_checked,
                score: section.score,
                remarks: section.remarks.clone().unwrap_or_default(),
                lain_lain_text: section.lain_lain_text.clone().unwrap_or_default(),
            });
        }
    }
    out
}

/// Resizes an answer vector to the label count; missing answers read as unchecked.
fn aligned(answers: &[bool], len: usize) -> Vec<bool> {
    (0..len).map(|i| answers.get(i).copied().unwrap_or(false)).collect()
}
