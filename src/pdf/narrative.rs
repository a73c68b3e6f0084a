//! Narrative visit report: a flowing A4 document built from scratch.
//!
//! Layout is a single cursor moving down the page. Every primitive checks
//! that its own line fits above the bottom margin and starts a new page when
//! it does not.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{error, info};

use super::canvas::{Canvas, PrintCanvas, TextStyle};
use super::images::{scale_to_fit, EmbeddedImage, ImageEmbedder};
use super::text::{clamp_lines, text_width, wrap_text, Face};
use super::TOP_Y;
use crate::error::ReportError;
use crate::models::{SectionInput, VisitImage};

pub const LEFT_X: f32 = 50.0;
pub const CONTENT_WIDTH: f32 = 495.0;
pub const BOTTOM_MARGIN: f32 = 40.0;
const BODY_SIZE: f32 = 11.0;
const BULLET: &str = "•";

const IMAGE_INDENT: f32 = 20.0;
const IMAGE_BOX: (f32, f32) = (400.0, 225.0);
const IMAGE_CAPTION_SIZE: f32 = 9.0;
const IMAGE_CAPTION_LINE: f32 = 12.0;
const IMAGE_CAPTION_MAX_LINES: usize = 4;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NarrativeRequest {
    pub school_name: String,
    pub visit_date: String,
    #[serde(default)]
    pub officer_name: Option<String>,
    #[serde(default)]
    pub pgb: Option<String>,
    #[serde(default)]
    pub sesi_bimbingan: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
    #[serde(default)]
    pub images: Vec<VisitImage>,
}

pub struct FlowLayout<'c, C: Canvas> {
    canvas: &'c mut C,
    y: f32,
}

impl<'c, C: Canvas> FlowLayout<'c, C> {
    pub fn new(canvas: &'c mut C) -> Self {
        Self { canvas, y: TOP_Y }
    }

    pub fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < BOTTOM_MARGIN {
            self.canvas.new_page();
            self.y = TOP_Y;
        }
    }

    pub fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    /// One unwrapped line at the cursor.
    pub fn draw(&mut self, text: &str, size: f32, face: Face) {
        self.ensure_room(size + 4.0);
        self.canvas.text(text, LEFT_X, self.y, TextStyle { size, face, gray: 0.0 });
        self.y -= size + 4.0;
    }

    /// Word-wrapped body text; `bullet` prefixes the first line only.
    pub fn draw_wrapped(&mut self, text: &str, size: f32, bullet: Option<&str>) {
        self.flow(text, TextStyle::regular(size), size + 3.0, bullet);
    }

    fn flow(&mut self, text: &str, style: TextStyle, step: f32, bullet: Option<&str>) {
        let prefix = bullet.map(|b| format!("{} ", b)).unwrap_or_default();
        let width = CONTENT_WIDTH - text_width(&prefix, style.face, style.size);
        for (i, line) in wrap_text(text, width, style.face, style.size).into_iter().enumerate() {
            self.ensure_room(step);
            let line = if i == 0 { format!("{}{}", prefix, line) } else { line };
            self.canvas.text(&line, LEFT_X, self.y, style);
            self.y -= step;
        }
    }

    fn heading(&mut self, text: &str) {
        self.draw(text, BODY_SIZE, Face::Bold);
    }
}

fn aspek_prefix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*ASPEK\s+\d+(?:\.\d+)*\s*:").ok()).as_ref()
}

fn sub_heading() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\.\d+\.\d+(?:\.\d+)?\b").ok()).as_ref()
}

fn plan_marker() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+([a-z]\))").ok()).as_ref()
}

/// Splits a page title into its main heading and numbered sub-heading.
///
/// `"ASPEK 1.1: PGB SEBAGAI PENERAJU 1.1.1 PGB menetapkan..."` yields
/// `("ASPEK 1.1: PGB SEBAGAI PENERAJU", Some("1.1.1 PGB menetapkan..."))`.
/// The sub-heading starts at the first three- or four-part number after the
/// `ASPEK n.n:` prefix. Titles without one are returned whole.
pub fn split_title(title: &str) -> (&str, Option<&str>) {
    let whole = (title.trim(), None);
    let Some(numbered) = sub_heading() else { return whole };
    let start = aspek_prefix().and_then(|re| re.find(title)).map(|m| m.end()).unwrap_or(0);
    let Some(found) = numbered.find_at(title, start) else { return whole };

    let main = title[..found.start()].trim();
    if main.is_empty() {
        return whole;
    }
    (main, Some(title[found.start()..].trim()))
}

/// Breaks a PLAN paragraph into its lead-in and `a)`, `b)`, ... items.
pub fn split_plan_items(plan: &str) -> Vec<String> {
    let separated = match plan_marker() {
        Some(re) => re.replace_all(plan, "\n$1").into_owned(),
        None => plan.to_string(),
    };
    separated.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()
}

fn is_lettered_item(line: &str) -> bool {
    let mut chars = line.chars();
    matches!((chars.next(), chars.next()), (Some(c), Some(')')) if c.is_ascii_alphabetic())
}

fn non_blank(text: &str) -> Option<&str> {
    Some(text.trim()).filter(|t| !t.is_empty())
}

fn or_dash(value: &str) -> &str {
    non_blank(value).unwrap_or("-")
}

fn render_header<C: Canvas>(layout: &mut FlowLayout<C>, request: &NarrativeRequest) {
    layout.draw("SIP+ Visit Report", 18.0, Face::Bold);
    layout.draw(&format!("Sekolah: {}", or_dash(&request.school_name)), BODY_SIZE, Face::Regular);
    layout.draw(&format!("Tarikh: {}", or_dash(&request.visit_date)), BODY_SIZE, Face::Regular);

    let optional = [
        ("Nama Pegawai", &request.officer_name),
        ("PGB", &request.pgb),
        ("Sesi Bimbingan", &request.sesi_bimbingan),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().and_then(non_blank) {
            layout.draw(&format!("{}: {}", label, value), BODY_SIZE, Face::Regular);
        }
    }
}

fn render_images<C: Canvas>(layout: &mut FlowLayout<C>, images: &[VisitImage], embedded: &[Option<EmbeddedImage>]) {
    if images.is_empty() {
        return;
    }
    layout.ensure_room(250.0);
    layout.draw("IMAGES:", BODY_SIZE, Face::Bold);
    layout.gap(20.0);

    for (image, decoded) in images.iter().zip(embedded.iter().chain(std::iter::repeat(&None))) {
        match decoded {
            Some(decoded) => {
                let (w, h) = scale_to_fit(decoded.size(), IMAGE_BOX);
                let caption = clamp_lines(
                    wrap_text(image.caption(), IMAGE_BOX.0, Face::Regular, IMAGE_CAPTION_SIZE),
                    IMAGE_CAPTION_MAX_LINES,
                    IMAGE_BOX.0,
                    Face::Regular,
                    IMAGE_CAPTION_SIZE,
                );
                let extra = caption.len().saturating_sub(1) as f32 * IMAGE_CAPTION_LINE;
                layout.ensure_room(h + 40.0 + extra);

                let x = LEFT_X + IMAGE_INDENT;
                let top = layout.y;
                layout.canvas.image(decoded, x, top - h, w, h);
                for (i, line) in caption.iter().enumerate() {
                    let y = top - h - 20.0 - i as f32 * IMAGE_CAPTION_LINE;
                    layout.canvas.text(line, x, y, TextStyle::regular(IMAGE_CAPTION_SIZE).gray(0.5));
                }
                layout.gap(h + 40.0 + extra);
            }
            None => {
                layout.ensure_room(30.0);
                layout.draw_wrapped(&format!("{} {} (image not available)", BULLET, image.caption()), BODY_SIZE, None);
                layout.gap(30.0);
            }
        }
    }
    layout.gap(20.0);
}

fn render_checklist<C: Canvas>(layout: &mut FlowLayout<C>, heading: &str, labels: &[String], checked: &[bool]) {
    if labels.is_empty() {
        return;
    }
    layout.heading(heading);
    for (i, label) in labels.iter().enumerate() {
        let mark = if checked.get(i).copied().unwrap_or(false) { "[X]" } else { "[ ]" };
        layout.draw_wrapped(&format!("{} {}", mark, label), BODY_SIZE, None);
    }
    layout.gap(8.0);
}

fn render_section<C: Canvas>(layout: &mut FlowLayout<C>, section: &SectionInput) {
    layout.ensure_room(28.0);
    let (main, subtitle) = split_title(&section.title);
    layout.flow(main, TextStyle::bold(BODY_SIZE), BODY_SIZE + 4.0, None);
    if let Some(subtitle) = subtitle {
        layout.flow(subtitle, TextStyle::regular(10.0), 14.0, None);
    }
    if let Some(score) = section.score {
        layout.draw(&format!("Skor: {}", score), BODY_SIZE, Face::Regular);
    }

    if !section.plan.is_empty() {
        layout.heading("PLAN:");
        for item in section.plan.iter().flat_map(|p| split_plan_items(p)) {
            let bullet = is_lettered_item(&item).then_some(BULLET);
            layout.draw_wrapped(&item, BODY_SIZE, bullet);
        }
        layout.gap(8.0);
    }

    layout.heading("DO:");
    layout.draw_wrapped(non_blank(&section.do_text).unwrap_or("No implementation details provided"), BODY_SIZE, None);
    layout.gap(8.0);

    render_checklist(layout, "CHECK:", &section.checklist_labels, &section.checklist_checked);

    layout.heading("ACT:");
    layout.draw_wrapped(non_blank(&section.act_text).unwrap_or("No follow-up actions provided"), BODY_SIZE, None);
    layout.gap(8.0);

    render_checklist(layout, "EVIDENCE:", &section.evidence_labels, &section.evidence_checked);

    for (heading, text) in [("REMARKS:", &section.remarks), ("LAIN-LAIN:", &section.lain_lain_text)] {
        if let Some(text) = non_blank(text) {
            layout.heading(heading);
            layout.draw_wrapped(text, BODY_SIZE, None);
            layout.gap(8.0);
        }
    }

    layout.gap(15.0);
}

/// Lays out the whole report. `embedded[i]` is the decoded form of
/// `request.images[i]`; `None` draws the "image not available" line.
pub fn render_narrative<C: Canvas>(canvas: &mut C, request: &NarrativeRequest, embedded: &[Option<EmbeddedImage>]) {
    let mut layout = FlowLayout::new(canvas);
    render_header(&mut layout, request);
    render_images(&mut layout, &request.images, embedded);
    for section in &request.sections {
        render_section(&mut layout, section);
    }
}

/// Runs a document build, turning any error or panic into
/// [`ReportError::GenerationFailed`]. The cause is only logged.
fn guarded(build: impl FnOnce() -> Result<Vec<u8>, ReportError>) -> Result<Vec<u8>, ReportError> {
    match catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => {
            error!("❌ Narrative report failed: {}", e);
            Err(ReportError::GenerationFailed)
        }
        Err(panic) => {
            let cause = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("❌ Narrative report panicked: {}", cause);
            Err(ReportError::GenerationFailed)
        }
    }
}

/// Generates the narrative visit report.
///
/// Images are fetched first, in order; rendering then runs synchronously.
pub async fn generate_narrative(request: &NarrativeRequest, embedder: &ImageEmbedder) -> Result<Vec<u8>, ReportError> {
    let embedded = embedder.embed_all(&request.images).await;
    let bytes = guarded(|| {
        let mut canvas = PrintCanvas::new("SIP+ Visit Report")?;
        render_narrative(&mut canvas, request, &embedded);
        info!("📝 Narrative report: {} sections, {} pages", request.sections.len(), canvas.page_count());
        canvas.finish()
    })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use crate::models::StandardCode;
    use crate::pdf::canvas::testing::{Op, RecordingCanvas};
    use crate::pdf::images::testing::png_data_url;
    use lopdf::content::Content;
    use lopdf::{Document, Object};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn embedder() -> ImageEmbedder {
        ImageEmbedder::new(HttpFetcher::new(Duration::from_secs(2), 0).unwrap())
    }

    fn request() -> NarrativeRequest {
        NarrativeRequest { school_name: "SK Seri Indah".into(), visit_date: "2024-05-02".into(), ..Default::default() }
    }

    fn section() -> SectionInput {
        SectionInput {
            standard_code: StandardCode::Kepimpinan,
            page_code: "1-2".into(),
            title: "ASPEK 1.1: PGB SEBAGAI PENERAJU 1.1.1 PGB menetapkan hala tuju sekolah secara terancang".into(),
            plan: vec!["Membimbing PGB: a) Membuat analisis SWOT b) Menentukan KPI".into()],
            do_text: "Analisis SWOT dibincangkan".into(),
            act_text: String::new(),
            checklist_labels: vec!["Hala tuju didokumenkan".into(), "Hala tuju disebarluas".into()],
            checklist_checked: vec![true, false],
            evidence_labels: vec!["SWOT".into(), "Minit Mesyuarat Guru".into()],
            evidence_checked: vec![false, true],
            score: Some(3),
            remarks: "Baik".into(),
            lain_lain_text: "  ".into(),
        }
    }

    fn image(description: &str, url: &str) -> VisitImage {
        VisitImage {
            id: "img-1".into(),
            filename: "171-dewan.jpg".into(),
            original_name: "dewan.jpg".into(),
            description: Some(description.into()),
            section_code: None,
            public_url: Some(url.into()),
            uploaded_at: None,
        }
    }

    fn strings(objects: &[Object], out: &mut String) {
        for object in objects {
            match object {
                Object::String(bytes, _) => out.push_str(&String::from_utf8_lossy(bytes)),
                Object::Array(items) => strings(items, out),
                _ => {}
            }
        }
    }

    fn pdf_text(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let mut out = String::new();
        for page_id in doc.get_pages().values() {
            let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
            for op in content.operations.iter().filter(|op| op.operator == "Tj" || op.operator == "TJ") {
                strings(&op.operands, &mut out);
                out.push('\n');
            }
        }
        out
    }

    #[test]
    fn titles_split_after_the_aspek_prefix() {
        assert_eq!(
            split_title("ASPEK 1.1: PGB SEBAGAI PENERAJU 1.1.1 PGB menetapkan hala tuju"),
            ("ASPEK 1.1: PGB SEBAGAI PENERAJU", Some("1.1.1 PGB menetapkan hala tuju"))
        );
        assert_eq!(
            split_title("ASPEK 3.1.1: KETETAPAN PELAKSANAAN KURIKULUM 3.1.1.1 Pelaksanaan kurikulum diurus"),
            ("ASPEK 3.1.1: KETETAPAN PELAKSANAAN KURIKULUM", Some("3.1.1.1 Pelaksanaan kurikulum diurus"))
        );
    }

    #[test]
    fn titles_without_sub_heading_stay_whole() {
        assert_eq!(split_title("ASPEK 2.1: PENGURUSAN SUMBER MANUSIA"), ("ASPEK 2.1: PENGURUSAN SUMBER MANUSIA", None));
        assert_eq!(split_title("1.1.1 starts with a number"), ("1.1.1 starts with a number", None));
        assert_eq!(split_title(""), ("", None));
        assert_eq!(split_title("Pengurusan 2.2.1 Aset"), ("Pengurusan", Some("2.2.1 Aset")));
    }

    #[test]
    fn plan_items_split_on_letter_markers() {
        assert_eq!(
            split_plan_items("Membimbing PGB: a) Membuat analisis SWOT b) Menentukan KPI C) Mendokumen"),
            vec!["Membimbing PGB:", "a) Membuat analisis SWOT", "b) Menentukan KPI", "C) Mendokumen"]
        );
        assert!(is_lettered_item("a) Membuat"));
        assert!(!is_lettered_item("Membimbing PGB:"));
    }

    #[test]
    fn header_lists_only_present_fields() {
        let mut canvas = RecordingCanvas::default();
        let req = NarrativeRequest { pgb: Some("Puan Aminah".into()), officer_name: Some(" ".into()), ..request() };
        render_narrative(&mut canvas, &req, &[]);
        assert_eq!(canvas.texts(), vec!["SIP+ Visit Report", "Sekolah: SK Seri Indah", "Tarikh: 2024-05-02", "PGB: Puan Aminah"]);

        let (x, y, style) = canvas.text_op("SIP+ Visit Report").unwrap();
        assert_eq!((x, y), (LEFT_X, TOP_Y));
        assert_eq!(style, TextStyle::bold(18.0));
        assert_eq!(canvas.text_op("Sekolah: SK Seri Indah").unwrap().1, TOP_Y - 22.0);
    }

    #[test]
    fn headings_near_the_bottom_move_to_the_next_page() {
        let mut canvas = RecordingCanvas::default();
        let mut layout = FlowLayout::new(&mut canvas);
        layout.gap(TOP_Y - BOTTOM_MARGIN - 10.0);
        layout.heading("DO:");
        assert_eq!(layout.y, TOP_Y - BODY_SIZE - 4.0);
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.text_op("DO:").unwrap().1, TOP_Y);
    }

    #[test]
    fn section_blocks_render_in_order() {
        let mut canvas = RecordingCanvas::default();
        let req = NarrativeRequest { sections: vec![section()], ..request() };
        render_narrative(&mut canvas, &req, &[]);

        assert_eq!(
            canvas.texts()[3..].to_vec(),
            vec![
                "ASPEK 1.1: PGB SEBAGAI PENERAJU",
                "1.1.1 PGB menetapkan hala tuju sekolah secara terancang",
                "Skor: 3",
                "PLAN:",
                "Membimbing PGB:",
                "• a) Membuat analisis SWOT",
                "• b) Menentukan KPI",
                "DO:",
                "Analisis SWOT dibincangkan",
                "CHECK:",
                "[X] Hala tuju didokumenkan",
                "[ ] Hala tuju disebarluas",
                "ACT:",
                "No follow-up actions provided",
                "EVIDENCE:",
                "[ ] SWOT",
                "[X] Minit Mesyuarat Guru",
                "REMARKS:",
                "Baik",
            ]
        );
        assert_eq!(canvas.text_op("1.1.1 PGB menetapkan hala tuju sekolah secara terancang").unwrap().2, TextStyle::regular(10.0));
    }

    #[test]
    fn bullet_only_prefixes_the_first_wrapped_line() {
        let mut canvas = RecordingCanvas::default();
        let mut layout = FlowLayout::new(&mut canvas);
        let long = "a) Merancang dan melaksanakan program pembangunan profesionalisme yang berkaitan dengan mata pelajaran serta menilai keberkesanan program secara berkala";
        layout.draw_wrapped(long, BODY_SIZE, Some(BULLET));
        let after = layout.y;

        let lines = canvas.texts();
        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("• a)"));
        assert!(lines[1..].iter().all(|l| !l.starts_with('•')));
        assert_eq!(after, TOP_Y - lines.len() as f32 * 14.0);
    }

    #[test]
    fn long_reports_paginate_above_the_bottom_margin() {
        let mut canvas = RecordingCanvas::default();
        let req = NarrativeRequest { sections: vec![section(); 12], ..request() };
        render_narrative(&mut canvas, &req, &[]);

        assert!(canvas.page_count() > 2);
        for op in &canvas.ops {
            if let Op::Text { y, text, .. } = op {
                assert!(*y >= BOTTOM_MARGIN, "{text} drawn at {y}");
                assert!(*y <= TOP_Y);
            }
        }
    }

    #[test]
    fn ensure_room_starts_a_page_only_when_needed() {
        let mut canvas = RecordingCanvas::default();
        let mut layout = FlowLayout::new(&mut canvas);
        layout.gap(700.0);
        layout.ensure_room(60.0);
        assert_eq!(layout.y, 100.0);
        layout.ensure_room(61.0);
        assert_eq!(layout.y, TOP_Y);
        assert_eq!(canvas.page_count(), 2);
    }

    #[test]
    fn long_image_captions_are_cut_above_the_bottom_margin() {
        let mut canvas = RecordingCanvas::default();
        let description = "Murid menjalankan aktiviti PdP abad ke-21 di makmal sains ".repeat(95);
        let req = NarrativeRequest { images: vec![image(&description, "https://x/a.png")], ..request() };
        let photo = EmbeddedImage { width: 800, height: 600, rgb: vec![0; 800 * 600 * 3] };
        render_narrative(&mut canvas, &req, &[Some(photo)]);

        let captions: Vec<&str> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { text, style, .. } if style.size == IMAGE_CAPTION_SIZE => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(captions.len(), IMAGE_CAPTION_MAX_LINES);
        assert!(captions[IMAGE_CAPTION_MAX_LINES - 1].ends_with('…'));
        for op in &canvas.ops {
            if let Op::Text { y, text, .. } = op {
                assert!(*y >= BOTTOM_MARGIN, "{text} drawn at {y}");
            }
        }
    }

    #[test]
    fn images_are_fitted_into_the_box_with_grey_captions() {
        let mut canvas = RecordingCanvas::default();
        let req = NarrativeRequest { images: vec![image("Perhimpunan pagi", "https://x/a.png")], ..request() };
        let photo = EmbeddedImage { width: 800, height: 600, rgb: vec![0; 800 * 600 * 3] };
        render_narrative(&mut canvas, &req, &[Some(photo)]);

        let images = canvas.images();
        assert_eq!(images.len(), 1);
        let (x, y, w, h) = images[0];
        assert_eq!((w, h), (300.0, 225.0));
        assert_eq!(x, LEFT_X + IMAGE_INDENT);

        let (_, caption_y, style) = canvas.text_op("Perhimpunan pagi").unwrap();
        assert_eq!(caption_y, y - 20.0);
        assert_eq!(style, TextStyle::regular(9.0).gray(0.5));
    }

    #[test]
    fn unavailable_images_fall_back_to_a_text_line() {
        let mut canvas = RecordingCanvas::default();
        let req = NarrativeRequest { images: vec![image("Dewan sekolah", "http://127.0.0.1:9/a.jpg")], ..request() };
        render_narrative(&mut canvas, &req, &[None]);
        assert!(canvas.images().is_empty());
        assert!(canvas.texts().contains(&"• Dewan sekolah (image not available)"));
    }

    #[tokio::test]
    async fn empty_report_is_a_single_page_header() {
        let bytes = generate_narrative(&request(), &embedder()).await.unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let text = pdf_text(&bytes);
        assert!(text.contains("SIP+ Visit Report"));
        assert!(text.contains("Sekolah: SK Seri Indah"));
    }

    #[tokio::test]
    async fn unreachable_image_still_produces_a_report() {
        let req = NarrativeRequest {
            images: vec![image("Dewan sekolah", "http://127.0.0.1:9/visit-images/dewan.jpg"), image("Kelas", &png_data_url(8, 6))],
            sections: vec![section()],
            ..request()
        };
        let bytes = generate_narrative(&req, &embedder()).await.unwrap();
        let text = pdf_text(&bytes);
        assert!(text.contains("Dewan sekolah (image not available)"));
        assert!(text.contains("Kelas"));
    }

    #[test]
    fn guard_hides_failures_behind_generic_error() {
        let err = guarded(|| Err(ReportError::Pdf("broken font".into()))).unwrap_err();
        assert_eq!(err.to_string(), crate::error::GENERATION_FAILED);

        let err = guarded(|| panic!("layout bug")).unwrap_err();
        assert!(matches!(err, ReportError::GenerationFailed));
    }
}
