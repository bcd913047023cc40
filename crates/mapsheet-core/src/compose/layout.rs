//! Page geometry in device pixels

use image::{imageops, Rgb, RgbImage};

/// Output resolution
pub const DPI: f64 = 300.0;
pub const MM_PER_INCH: f64 = 25.4;

/// A4 landscape
pub const PAGE_WIDTH_MM: f64 = 297.0;
pub const PAGE_HEIGHT_MM: f64 = 210.0;
pub const MARGIN_MM: f64 = 10.0;

/// Black bar between the wide and detail views
pub const SEPARATOR_WIDTH_PX: u32 = 6;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

pub fn mm_to_px(mm: f64) -> u32 {
    (mm * DPI / MM_PER_INCH).round() as u32
}

/// Axis-aligned box on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: mm_to_px(PAGE_WIDTH_MM),
            height: mm_to_px(PAGE_HEIGHT_MM),
            margin: mm_to_px(MARGIN_MM),
        }
    }
}

impl PageGeometry {
    /// Area inside the margins
    pub fn usable(&self) -> Placement {
        Placement {
            x: self.margin,
            y: self.margin,
            width: self.width.saturating_sub(self.margin * 2),
            height: self.height.saturating_sub(self.margin * 2),
        }
    }

    /// Largest aspect-preserving box for `width`×`height` inside the usable
    /// area, centred in it
    pub fn fit(&self, width: u32, height: u32) -> Placement {
        let area = self.usable();
        let scale = f64::min(
            area.width as f64 / width.max(1) as f64,
            area.height as f64 / height.max(1) as f64,
        );
        let fitted_w = ((width as f64 * scale).round() as u32).clamp(1, area.width.max(1));
        let fitted_h = ((height as f64 * scale).round() as u32).clamp(1, area.height.max(1));

        Placement {
            x: area.x + (area.width - fitted_w) / 2,
            y: area.y + (area.height - fitted_h) / 2,
            width: fitted_w,
            height: fitted_h,
        }
    }

    /// Page size in PDF points
    pub fn size_pt(&self) -> (f64, f64) {
        (px_to_pt(self.width), px_to_pt(self.height))
    }
}

pub fn px_to_pt(px: u32) -> f64 {
    px as f64 * 72.0 / DPI
}

/// Place two views side by side with a full-height separator bar.
/// The result is as tall as the taller view; uncovered area stays white.
pub fn join_side_by_side(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let width = left.width() + SEPARATOR_WIDTH_PX + right.width();
    let height = left.height().max(right.height());

    let mut joined = RgbImage::from_pixel(width, height, WHITE);
    imageops::replace(&mut joined, left, 0, 0);
    imageops::replace(
        &mut joined,
        right,
        (left.width() + SEPARATOR_WIDTH_PX) as i64,
        0,
    );

    for x in left.width()..left.width() + SEPARATOR_WIDTH_PX {
        for y in 0..height {
            joined.put_pixel(x, y, BLACK);
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_landscape_pixels() {
        let page = PageGeometry::default();
        assert_eq!((page.width, page.height), (3508, 2480));
        assert_eq!(page.margin, 118);
        assert_eq!(mm_to_px(25.0), 295);
    }

    #[test]
    fn test_fit_two_tiles_is_height_bound() {
        let page = PageGeometry::default();
        // two 800x1600 tiles plus separator
        let placed = page.fit(1606, 1600);
        assert_eq!(placed.height, 2244);
        assert_eq!(placed.y, 118);
        assert!(placed.width <= page.usable().width);
        // centred horizontally
        let left_gap = placed.x - page.margin;
        let right_gap = page.width - page.margin - placed.right();
        assert!(left_gap.abs_diff(right_gap) <= 1);
    }

    #[test]
    fn test_fit_wide_image_is_width_bound() {
        let page = PageGeometry::default();
        let placed = page.fit(4000, 100);
        assert_eq!(placed.width, page.usable().width);
        assert_eq!(placed.x, page.margin);
    }

    #[test]
    fn test_join_differing_heights() {
        let left = RgbImage::from_pixel(10, 20, Rgb([200, 0, 0]));
        let right = RgbImage::from_pixel(12, 30, Rgb([0, 200, 0]));
        let joined = join_side_by_side(&left, &right);

        assert_eq!(joined.dimensions(), (10 + SEPARATOR_WIDTH_PX + 12, 30));
        for y in 0..30 {
            for x in 10..10 + SEPARATOR_WIDTH_PX {
                assert_eq!(joined.get_pixel(x, y), &BLACK);
            }
        }
        // below the shorter view
        assert_eq!(joined.get_pixel(0, 25), &WHITE);
        assert_eq!(joined.get_pixel(0, 5), &Rgb([200, 0, 0]));
        assert_eq!(joined.get_pixel(20, 25), &Rgb([0, 200, 0]));
    }

    #[test]
    fn test_page_size_points() {
        let (w, h) = PageGeometry::default().size_pt();
        assert!((w - 841.92).abs() < 1e-9);
        assert!((h - 595.2).abs() < 1e-9);
    }
}
