//! Text rasterisation

use std::path::Path;

use image::{Rgba, RgbImage};
use rusttype::{point, Font, Scale};

use crate::error::SheetError;

/// Measures and draws single lines of text onto an RGB canvas
pub trait GlyphRenderer: Send + Sync {
    /// Advance width of `text` at `px`
    fn line_width(&self, text: &str, px: f32) -> u32;

    /// Distance between baselines of consecutive lines, without extra spacing
    fn line_height(&self, px: f32) -> u32;

    /// Draw `text` with its top-left corner at (`x`, `y`). The colour's alpha
    /// scales glyph coverage.
    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, px: f32, color: Rgba<u8>, text: &str);
}

/// Font size, extra line spacing and colour for a block of lines
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub px: f32,
    pub spacing: u32,
    pub color: Rgba<u8>,
}

/// Size of a block of lines
pub fn measure_block(renderer: &dyn GlyphRenderer, lines: &[String], style: TextStyle) -> (u32, u32) {
    if lines.is_empty() {
        return (0, 0);
    }
    let width = lines
        .iter()
        .map(|l| renderer.line_width(l, style.px))
        .max()
        .unwrap_or(0);
    let n = lines.len() as u32;
    let height = n * renderer.line_height(style.px) + (n - 1) * style.spacing;
    (width, height)
}

/// Draw a block of lines measured with [`measure_block`]
pub fn draw_block(
    renderer: &dyn GlyphRenderer,
    canvas: &mut RgbImage,
    (x, y): (i32, i32),
    style: TextStyle,
    lines: &[String],
) {
    let step = (renderer.line_height(style.px) + style.spacing) as i32;
    for (i, line) in lines.iter().enumerate() {
        renderer.draw_line(canvas, x, y + step * i as i32, style.px, style.color, line);
    }
}

/// Renderer backed by a TrueType font or the first face of a collection
pub struct FontRenderer {
    font: Font<'static>,
}

impl FontRenderer {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SheetError> {
        let font = Font::try_from_vec_and_index(bytes, 0)
            .ok_or_else(|| SheetError::Render("unsupported font data".to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| SheetError::Render(format!("cannot read font {}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }
}

impl GlyphRenderer for FontRenderer {
    fn line_width(&self, text: &str, px: f32) -> u32 {
        let scale = Scale::uniform(px);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
            .ceil() as u32
    }

    fn line_height(&self, px: f32) -> u32 {
        let v = self.font.v_metrics(Scale::uniform(px));
        (v.ascent - v.descent).ceil() as u32
    }

    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, px: f32, color: Rgba<u8>, text: &str) {
        let scale = Scale::uniform(px);
        let ascent = self.font.v_metrics(scale).ascent;
        let origin = point(x as f32, y as f32 + ascent);
        let opacity = color.0[3] as f32 / 255.0;

        for glyph in self.font.layout(text, scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let cx = gx as i32 + bb.min.x;
                let cy = gy as i32 + bb.min.y;
                if cx < 0 || cy < 0 || cx as u32 >= canvas.width() || cy as u32 >= canvas.height() {
                    return;
                }
                let alpha = coverage * opacity;
                if alpha <= 0.0 {
                    return;
                }
                let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
                for c in 0..3 {
                    dst.0[c] = (color.0[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha)).round() as u8;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is a `px/2`-wide cell
    struct CellRenderer;

    impl GlyphRenderer for CellRenderer {
        fn line_width(&self, text: &str, px: f32) -> u32 {
            text.chars().count() as u32 * (px as u32 / 2)
        }

        fn line_height(&self, px: f32) -> u32 {
            px as u32
        }

        fn draw_line(&self, _: &mut RgbImage, _: i32, _: i32, _: f32, _: Rgba<u8>, _: &str) {}
    }

    const STYLE: TextStyle = TextStyle {
        px: 10.0,
        spacing: 6,
        color: Rgba([0, 0, 0, 255]),
    };

    #[test]
    fn test_measure_block() {
        let lines = vec!["abcd".to_string(), "ab".to_string(), "abcdef".to_string()];
        assert_eq!(measure_block(&CellRenderer, &lines, STYLE), (30, 3 * 10 + 2 * 6));
    }

    #[test]
    fn test_measure_empty_block() {
        assert_eq!(measure_block(&CellRenderer, &[], STYLE), (0, 0));
    }

    #[test]
    fn test_invalid_font_data() {
        assert!(FontRenderer::from_bytes(vec![0, 1, 2, 3]).is_err());
    }
}
