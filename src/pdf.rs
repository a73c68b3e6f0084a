//! PDF output: the stamped borang export and the narrative visit report.

pub mod canvas;
pub mod gallery;
pub mod images;
pub mod merge;
pub mod narrative;
pub mod overlay;
pub mod templates;
pub mod text;

/// A4 portrait in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;
/// First baseline on a freshly created page.
pub const TOP_Y: f32 = 800.0;

pub use images::ImageEmbedder;
pub use narrative::{generate_narrative, NarrativeRequest};
pub use overlay::{generate_overlay, OverlayRequest};
pub use templates::{DirTemplates, HttpTemplates, TemplateSource};
