//! Image appendix of the borang export: a three-column grid of captioned
//! photos grouped by standard.

use super::canvas::{Canvas, TextStyle};
use super::images::{scale_to_fit, EmbeddedImage};
use super::text::{clamp_lines, wrap_text, Face};
use super::{A4_WIDTH, TOP_Y};
use crate::models::StandardCode;

const MARGIN: f32 = 40.0;
const COLUMNS: usize = 3;
const GUTTER: f32 = 15.0;
const CELL_HEIGHT: f32 = 120.0;
const CAPTION_SIZE: f32 = 8.0;
const CAPTION_LINE: f32 = 10.0;
const CAPTION_GAP: f32 = 6.0;
const CAPTION_MAX_LINES: usize = 4;
const ROW_GAP: f32 = 14.0;
const TITLE: &str = "Visit Images";
const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 11.0;

pub struct GalleryItem<'a> {
    pub caption: &'a str,
    pub group: Option<StandardCode>,
    pub image: &'a EmbeddedImage,
}

fn cell_width() -> f32 {
    (A4_WIDTH - 2.0 * MARGIN - GUTTER * (COLUMNS as f32 - 1.0)) / COLUMNS as f32
}

fn group_heading(group: Option<StandardCode>) -> String {
    match group {
        Some(code) => format!("Standard {}", code),
        None => "Other images".to_string(),
    }
}

struct Grid<'c, C: Canvas> {
    canvas: &'c mut C,
    y: f32,
}

impl<C: Canvas> Grid<'_, C> {
    fn header(&mut self, continued: bool) {
        let title = if continued { format!("{} (continued)", TITLE) } else { TITLE.to_string() };
        self.canvas.text(&title, MARGIN, TOP_Y, TextStyle::bold(TITLE_SIZE));
        self.y = TOP_Y - TITLE_SIZE - 12.0;
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN {
            self.canvas.new_page();
            self.header(true);
        }
    }

    fn row(&mut self, items: &[&GalleryItem], captions: &[Vec<String>], height: f32) {
        let width = cell_width();
        for (col, (item, lines)) in items.iter().zip(captions).enumerate() {
            let cell_x = MARGIN + col as f32 * (width + GUTTER);
            let (w, h) = scale_to_fit(item.image.size(), (width, CELL_HEIGHT));
            self.canvas.image(item.image, cell_x + (width - w) / 2.0, self.y - h, w, h);

            let caption_top = self.y - CELL_HEIGHT - CAPTION_GAP - CAPTION_SIZE;
            for (i, line) in lines.iter().enumerate() {
                self.canvas.text(line, cell_x, caption_top - i as f32 * CAPTION_LINE, TextStyle::regular(CAPTION_SIZE).gray(0.3));
            }
        }
        self.y -= height;
    }
}

/// Lays out `items` on the canvas, which must be on a fresh first page.
/// Items keep their input order inside a group; groups follow standard order
/// with ungrouped images last.
pub fn render_gallery<C: Canvas>(canvas: &mut C, items: &[GalleryItem]) {
    let mut ordered: Vec<&GalleryItem> = items.iter().collect();
    ordered.sort_by_key(|item| (item.group.is_none(), item.group));

    let mut grid = Grid { canvas, y: TOP_Y };
    grid.header(false);

    let width = cell_width();
    for group in ordered.chunk_by(|a, b| a.group == b.group) {
        let heading_height = HEADING_SIZE + 8.0;
        let mut first_row = true;
        for row in group.chunks(COLUMNS) {
            let captions: Vec<Vec<String>> = row
                .iter()
                .map(|item| {
                    let lines = wrap_text(item.caption, width, Face::Regular, CAPTION_SIZE);
                    clamp_lines(lines, CAPTION_MAX_LINES, width, Face::Regular, CAPTION_SIZE)
                })
                .collect();
            let lines = captions.iter().map(Vec::len).max().unwrap_or(0);
            let height = CELL_HEIGHT + CAPTION_GAP + lines as f32 * CAPTION_LINE + ROW_GAP;

            if first_row {
                grid.ensure_room(heading_height + height);
                grid.canvas.text(&group_heading(group[0].group), MARGIN, grid.y - HEADING_SIZE, TextStyle::bold(HEADING_SIZE));
                grid.y -= heading_height;
                first_row = false;
            } else {
                grid.ensure_room(height);
            }
            grid.row(row, &captions, height);
        }
    }
}
