//! Document Composer
//!
//! Lays the map views, annotation box, QR code and optional watermark out on
//! an A4 landscape canvas at 300 DPI and serialises it as a single-page PDF.

pub mod annotation;
pub mod glyphs;
pub mod layout;
pub mod pdf;
pub mod qr;

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgb, Rgba, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::coords::Coordinates;
use crate::error::SheetError;

pub use annotation::Annotation;
pub use glyphs::{FontRenderer, GlyphRenderer, TextStyle};
pub use layout::{PageGeometry, Placement};
pub use qr::render_png as render_qr_png;

use glyphs::{draw_block, measure_block};
use layout::{join_side_by_side, mm_to_px, BLACK, WHITE};

pub const ANNOTATION_INSET: u32 = 10;
/// Total padding per axis; the text sits at half of it
pub const ANNOTATION_PADDING: u32 = 16;
pub const ANNOTATION_BORDER: u32 = 2;
pub const ANNOTATION_STYLE: TextStyle = TextStyle {
    px: 42.0,
    spacing: 6,
    color: Rgba([0, 0, 0, 255]),
};

pub const QR_SIZE_MM: f64 = 25.0;
/// White backing around the QR code
pub const QR_BOX_INSET: u32 = 4;

pub const WATERMARK_TEXT: &str = "DEMO";
pub const WATERMARK_STYLE: TextStyle = TextStyle {
    px: 200.0,
    spacing: 0,
    color: Rgba([255, 0, 0, 128]),
};

/// Composed page, ready to serialise
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub canvas: RgbImage,
    pub title: String,
    pub map_placement: Placement,
    pub qr_placement: Placement,
}

impl ComposedDocument {
    pub fn into_pdf(self) -> Result<Vec<u8>, SheetError> {
        pdf::write_single_page(&self.canvas, &self.title)
    }
}

pub struct DocumentComposer {
    renderer: Arc<dyn GlyphRenderer>,
    geometry: PageGeometry,
}

impl DocumentComposer {
    pub fn new(renderer: Arc<dyn GlyphRenderer>) -> Self {
        Self {
            renderer,
            geometry: PageGeometry::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Compose one or two map views (wide first) into a page
    pub fn compose(
        &self,
        at: Coordinates,
        maps: &[RgbImage],
        annotation: &Annotation,
        watermark: bool,
    ) -> Result<ComposedDocument, SheetError> {
        let joined = match maps {
            [single] => single.clone(),
            [wide, detail] => join_side_by_side(wide, detail),
            _ => {
                return Err(SheetError::Render(format!(
                    "expected one or two map views, got {}",
                    maps.len()
                )))
            }
        };

        let page = self.geometry;
        let mut canvas = RgbImage::from_pixel(page.width, page.height, WHITE);

        let map_placement = page.fit(joined.width(), joined.height());
        let scaled = imageops::resize(
            &joined,
            map_placement.width,
            map_placement.height,
            FilterType::Lanczos3,
        );
        imageops::replace(&mut canvas, &scaled, map_placement.x as i64, map_placement.y as i64);
        debug!(
            "Placed {}x{} map at ({}, {}) as {}x{}",
            joined.width(),
            joined.height(),
            map_placement.x,
            map_placement.y,
            map_placement.width,
            map_placement.height
        );

        self.draw_annotation(&mut canvas, map_placement, &annotation.lines(at));
        let qr_placement = self.draw_qr(&mut canvas, map_placement, &at.maps_link())?;

        if watermark {
            self.draw_watermark(&mut canvas);
        }

        Ok(ComposedDocument {
            canvas,
            title: annotation.title(),
            map_placement,
            qr_placement,
        })
    }

    fn draw_annotation(&self, canvas: &mut RgbImage, map: Placement, lines: &[String]) {
        let (text_w, text_h) = measure_block(self.renderer.as_ref(), lines, ANNOTATION_STYLE);
        let frame = Placement {
            x: map.x + ANNOTATION_INSET,
            y: map.y + ANNOTATION_INSET,
            width: text_w + ANNOTATION_PADDING,
            height: text_h + ANNOTATION_PADDING,
        };

        fill(canvas, frame, WHITE);
        outline(canvas, frame, ANNOTATION_BORDER, BLACK);
        draw_block(
            self.renderer.as_ref(),
            canvas,
            (
                (frame.x + ANNOTATION_PADDING / 2) as i32,
                (frame.y + ANNOTATION_PADDING / 2) as i32,
            ),
            ANNOTATION_STYLE,
            lines,
        );
    }

    /// QR code at the bottom-right of the placed map, inset by the page margin
    fn draw_qr(&self, canvas: &mut RgbImage, map: Placement, link: &str) -> Result<Placement, SheetError> {
        let size = mm_to_px(QR_SIZE_MM);
        let code = qr::render_for_sheet(link, size)?;

        let margin = self.geometry.margin;
        let placement = Placement {
            x: map.right().saturating_sub(margin + size),
            y: map.bottom().saturating_sub(margin + size),
            width: size,
            height: size,
        };

        let backing = Placement {
            x: placement.x.saturating_sub(QR_BOX_INSET),
            y: placement.y.saturating_sub(QR_BOX_INSET),
            width: size + QR_BOX_INSET * 2,
            height: size + QR_BOX_INSET * 2,
        };
        fill(canvas, backing, WHITE);
        outline(canvas, backing, 1, BLACK);
        imageops::replace(canvas, &code, placement.x as i64, placement.y as i64);

        Ok(placement)
    }

    fn draw_watermark(&self, canvas: &mut RgbImage) {
        let lines = [WATERMARK_TEXT.to_string()];
        let (w, h) = measure_block(self.renderer.as_ref(), &lines, WATERMARK_STYLE);
        let x = (canvas.width() as i32 - w as i32) / 2;
        let y = (canvas.height() as i32 - h as i32) / 2;
        draw_block(self.renderer.as_ref(), canvas, (x, y), WATERMARK_STYLE, &lines);
    }
}

fn rect(p: Placement) -> Option<Rect> {
    if p.width == 0 || p.height == 0 {
        return None;
    }
    Some(Rect::at(p.x as i32, p.y as i32).of_size(p.width, p.height))
}

fn fill(canvas: &mut RgbImage, p: Placement, color: Rgb<u8>) {
    if let Some(r) = rect(p) {
        draw_filled_rect_mut(canvas, r, color);
    }
}

fn outline(canvas: &mut RgbImage, p: Placement, thickness: u32, color: Rgb<u8>) {
    for i in 0..thickness {
        let inner = Placement {
            x: p.x + i,
            y: p.y + i,
            width: p.width.saturating_sub(i * 2),
            height: p.height.saturating_sub(i * 2),
        };
        if let Some(r) = rect(inner) {
            draw_hollow_rect_mut(canvas, r, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Draws every character as a solid `px/2`×`px` block
    struct BlockRenderer;

    impl GlyphRenderer for BlockRenderer {
        fn line_width(&self, text: &str, px: f32) -> u32 {
            text.chars().count() as u32 * (px as u32 / 2)
        }

        fn line_height(&self, px: f32) -> u32 {
            px as u32
        }

        fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, px: f32, color: Rgba<u8>, text: &str) {
            let w = self.line_width(text, px) as i32;
            let h = self.line_height(px) as i32;
            let alpha = color.0[3] as f32 / 255.0;
            for cy in y.max(0)..(y + h).min(canvas.height() as i32) {
                for cx in x.max(0)..(x + w).min(canvas.width() as i32) {
                    let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
                    for c in 0..3 {
                        dst.0[c] = (color.0[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha)).round() as u8;
                    }
                }
            }
        }
    }

    fn composer() -> DocumentComposer {
        DocumentComposer::new(Arc::new(BlockRenderer))
    }

    fn at() -> Coordinates {
        Coordinates::new(35.681236, 139.767125).unwrap()
    }

    fn tiles() -> Vec<RgbImage> {
        vec![
            RgbImage::from_pixel(40, 80, Rgb([120, 160, 200])),
            RgbImage::from_pixel(40, 80, Rgb([200, 160, 120])),
        ]
    }

    #[test]
    fn test_two_views_layout() {
        let c = composer();
        let doc = c.compose(at(), &tiles(), &Annotation::default(), false).unwrap();

        assert_eq!(doc.canvas.dimensions(), (3508, 2480));
        let expected = c.geometry().fit(40 + layout::SEPARATOR_WIDTH_PX + 40, 80);
        assert_eq!(doc.map_placement, expected);
        assert_eq!(doc.map_placement.y, 118);
        assert_eq!(doc.map_placement.bottom(), 2480 - 118);

        assert_eq!(doc.qr_placement.width, 295);
        assert_eq!(doc.qr_placement.right(), doc.map_placement.right() - 118);
        assert_eq!(doc.qr_placement.bottom(), doc.map_placement.bottom() - 118);
    }

    #[test]
    fn test_annotation_box_border() {
        let doc = composer()
            .compose(at(), &tiles(), &Annotation::default(), false)
            .unwrap();
        let map = doc.map_placement;
        let corner = (map.x + ANNOTATION_INSET, map.y + ANNOTATION_INSET);
        assert_eq!(doc.canvas.get_pixel(corner.0, corner.1), &BLACK);
        assert_eq!(doc.canvas.get_pixel(corner.0 + 1, corner.1 + 1), &BLACK);
        // padding inside the border stays white
        assert_eq!(doc.canvas.get_pixel(corner.0 + 4, corner.1 + 4), &WHITE);
        // first text block starts after the padding
        let text = (corner.0 + ANNOTATION_PADDING / 2, corner.1 + ANNOTATION_PADDING / 2);
        assert_eq!(doc.canvas.get_pixel(text.0, text.1), &BLACK);
    }

    #[test]
    fn test_annotation_box_hugs_text() {
        let c = composer();
        let annotation = Annotation::default();
        let doc = c.compose(at(), &tiles(), &annotation, false).unwrap();
        let lines = annotation.lines(at());
        let (text_w, text_h) = measure_block(&BlockRenderer, &lines, ANNOTATION_STYLE);

        let map = doc.map_placement;
        let left = map.x + ANNOTATION_INSET;
        let top = map.y + ANNOTATION_INSET;
        let right = left + text_w + ANNOTATION_PADDING - 1;
        let bottom = top + text_h + ANNOTATION_PADDING - 1;

        // the border's outer edge ends exactly at the padded text size
        assert_eq!(doc.canvas.get_pixel(right, top + text_h / 2), &BLACK);
        assert_eq!(doc.canvas.get_pixel(left + text_w / 2, bottom), &BLACK);
        assert_ne!(doc.canvas.get_pixel(right + 1, top + text_h / 2), &BLACK);
        assert_ne!(doc.canvas.get_pixel(left + text_w / 2, bottom + 1), &BLACK);
    }

    #[test]
    fn test_margins_stay_white() {
        let doc = composer()
            .compose(at(), &tiles(), &Annotation::default(), false)
            .unwrap();
        assert_eq!(doc.canvas.get_pixel(5, 5), &WHITE);
        assert_eq!(doc.canvas.get_pixel(3500, 2470), &WHITE);
    }

    #[test]
    fn test_watermark_tints_centre() {
        let c = composer();
        let grey = vec![RgbImage::from_pixel(40, 80, Rgb([90, 90, 90]))];
        let plain = c.compose(at(), &grey, &Annotation::default(), false).unwrap();
        let marked = c.compose(at(), &grey, &Annotation::default(), true).unwrap();

        let (cx, cy) = (3508 / 2, 2480 / 2);
        let before = plain.canvas.get_pixel(cx, cy);
        let after = marked.canvas.get_pixel(cx, cy);
        assert_ne!(before, after);
        assert!(after.0[0] > before.0[0]);
        assert!(after.0[1] < before.0[1]);
    }

    #[test]
    fn test_single_view() {
        let c = composer();
        let single = vec![RgbImage::from_pixel(40, 80, Rgb([90, 90, 90]))];
        let doc = c.compose(at(), &single, &Annotation::default(), false).unwrap();
        assert_eq!(doc.map_placement, c.geometry().fit(40, 80));
    }

    #[test]
    fn test_rejects_missing_views() {
        let err = composer()
            .compose(at(), &[], &Annotation::default(), false)
            .unwrap_err();
        assert!(matches!(err, SheetError::Render(_)));
    }

    #[test]
    fn test_into_pdf() {
        let annotation = Annotation {
            address: "東京駅".into(),
            property_name: "駅前倉庫".into(),
            vehicle_type: "4t".into(),
            ..Default::default()
        };
        let doc = composer().compose(at(), &tiles(), &annotation, true).unwrap();
        assert_eq!(doc.title, "駅前倉庫 東京駅");
        let pdf = doc.into_pdf().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }
}
