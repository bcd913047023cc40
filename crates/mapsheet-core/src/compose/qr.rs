//! QR code rasterisation

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use qrcode::{Color, QrCode};

use crate::error::SheetError;

/// Module size and quiet zone used on the printed sheet
pub const SHEET_BOX_SIZE: u32 = 6;
/// Module size for stand-alone PNG previews
pub const PREVIEW_BOX_SIZE: u32 = 8;
/// Quiet zone, in modules
pub const BORDER_MODULES: u32 = 2;

/// Black-on-white QR image with `box_size` pixels per module
pub fn render_modules(payload: &str, box_size: u32, border: u32) -> Result<GrayImage, SheetError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| SheetError::Render(format!("QR encoding failed: {}", e)))?;

    let modules = code.width() as u32;
    let side = (modules + border * 2) * box_size;
    let mut img = GrayImage::from_pixel(side, side, Luma([255]));

    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let mx = i as u32 % modules + border;
        let my = i as u32 / modules + border;
        for dy in 0..box_size {
            for dx in 0..box_size {
                img.put_pixel(mx * box_size + dx, my * box_size + dy, Luma([0]));
            }
        }
    }
    Ok(img)
}

/// QR block for the sheet, resampled to exactly `size`×`size` pixels
pub fn render_for_sheet(payload: &str, size: u32) -> Result<RgbImage, SheetError> {
    let modules = render_modules(payload, SHEET_BOX_SIZE, BORDER_MODULES)?;
    let rgb = DynamicImage::ImageLuma8(modules).to_rgb8();
    Ok(imageops::resize(&rgb, size, size, FilterType::Lanczos3))
}

/// PNG bytes of a preview QR code
pub fn render_png(payload: &str) -> Result<Vec<u8>, SheetError> {
    let img = render_modules(payload, PREVIEW_BOX_SIZE, BORDER_MODULES)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| SheetError::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(out.into_inner())
}
