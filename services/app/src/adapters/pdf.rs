//! services/app/src/adapters/pdf.rs
//!
//! This module contains the book export adapter, which implements the
//! `BookRenderer` port by drawing each finished page into a fixed
//! landscape two-column template: image on the left half, word-wrapped
//! text on the right, a folio on every sheet and the book title above the
//! first sheet's text block.

use async_trait::async_trait;
use printpdf::image_crate::GenericImageView;
use printpdf::{image_crate, BuiltinFont, Color, Image, ImageTransform, Mm, PdfDocument, Rgb};
use storyweaver_core::domain::StoryImage;
use storyweaver_core::ports::{BookRenderer, PortError, PortResult};

// A4 landscape, all lengths in millimeters.
const PAGE_WIDTH: f64 = 297.0;
const PAGE_HEIGHT: f64 = 210.0;
const MARGIN: f64 = 15.0;
const LINE_HEIGHT: f64 = 7.0;

const BODY_PT: f64 = 16.0;
const TITLE_PT: f64 = 24.0;
const FOLIO_PT: f64 = 10.0;

// Builtin fonts carry no glyph metrics, so the wrap width is an average
// character estimate for 16pt Times over the text column.
const WRAP_CHARS: usize = 42;

const IMAGE_DPI: f64 = 300.0;

/// Greedy word wrap against a character budget per line. Words longer than
/// the budget get a line of their own rather than being split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A PDF adapter that implements the `BookRenderer` port.
#[derive(Clone, Default)]
pub struct PdfBookRenderer;

impl PdfBookRenderer {
    /// Creates a new `PdfBookRenderer`.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BookRenderer for PdfBookRenderer {
    /// Draws one sheet per page, strictly in sequence order, and returns
    /// the finished document bytes. A page with empty text still renders
    /// (blank text block); an undecodable image fails the whole export.
    async fn render(&self, title: &str, pages: &[StoryImage]) -> PortResult<Vec<u8>> {
        let doc_title = if title.is_empty() { "my-story" } else { title };
        let (doc, first_page, first_layer) =
            PdfDocument::new(doc_title, Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Page 1");

        let body_font = doc
            .add_builtin_font(BuiltinFont::TimesRoman)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let title_font = doc
            .add_builtin_font(BuiltinFont::TimesBold)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let half_width = PAGE_WIDTH / 2.0;
        let column_width = half_width - MARGIN * 2.0;
        let column_height = PAGE_HEIGHT - MARGIN * 2.0;
        let text_x = half_width + MARGIN;

        for (i, page) in pages.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) =
                    doc.add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), format!("Page {}", i + 1));
                doc.get_page(page_index).get_layer(layer_index)
            };

            // -- Left Side: Image --
            let decoded = image_crate::load_from_memory(&page.data)
                .map_err(|e| PortError::Unexpected(format!("Could not decode image: {}", e)))?;
            let (px_width, px_height) = decoded.dimensions();
            let native_width = px_width as f64 * 25.4 / IMAGE_DPI;
            let native_height = px_height as f64 * 25.4 / IMAGE_DPI;
            let scale = (column_width / native_width).min(column_height / native_height);
            let final_width = native_width * scale;
            let final_height = native_height * scale;

            let image_x = MARGIN + (column_width - final_width) / 2.0;
            let image_y = (PAGE_HEIGHT - final_height) / 2.0;
            Image::from_dynamic_image(&decoded).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(image_x as f32)),
                    translate_y: Some(Mm(image_y as f32)),
                    scale_x: Some(scale as f32),
                    scale_y: Some(scale as f32),
                    dpi: Some(IMAGE_DPI as f32),
                    ..Default::default()
                },
            );

            // -- Right Side: Text, vertically centered --
            let text = page.story_segment.as_deref().unwrap_or("");
            let lines = wrap_text(text, WRAP_CHARS);
            let block_height = lines.len() as f64 * LINE_HEIGHT;
            let first_baseline = PAGE_HEIGHT / 2.0 + block_height / 2.0 - LINE_HEIGHT / 2.0;

            // Title above the text block of the first sheet only.
            if i == 0 {
                layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
                layer.use_text(
                    doc_title,
                    TITLE_PT as f32,
                    Mm(text_x as f32),
                    Mm((first_baseline + 20.0) as f32),
                    &title_font,
                );
            }

            layer.set_fill_color(Color::Rgb(Rgb::new(0.24, 0.24, 0.24, None)));
            let mut baseline = first_baseline;
            for line in &lines {
                layer.use_text(line.as_str(), BODY_PT as f32, Mm(text_x as f32), Mm(baseline as f32), &body_font);
                baseline -= LINE_HEIGHT;
            }

            // Folio in the bottom-right corner.
            layer.set_fill_color(Color::Rgb(Rgb::new(0.59, 0.59, 0.59, None)));
            layer.use_text(
                (i + 1).to_string(),
                FOLIO_PT as f32,
                Mm((PAGE_WIDTH - MARGIN) as f32),
                Mm(MARGIN as f32),
                &body_font,
            );
        }

        doc.save_to_bytes()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
