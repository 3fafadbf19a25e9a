//! QR Verification Encoder
//!
//! Builds the public verification URL for a registration and renders it as
//! an in-memory image. The symbol is scaled to a fixed pixel box with a
//! quiet-zone border so scanners pick it up from a printed page.

use image::{DynamicImage, GrayImage, Luma};
use qrcode::{Color, QrCode};

use crate::error::{PlatformError, Result};

/// Target edge length of the rendered symbol in pixels.
pub const QR_PIXEL_SIZE: u32 = 160;

/// Quiet-zone border around the symbol, in modules.
const QUIET_ZONE_MODULES: u32 = 2;

/// Verification URL encoded into the QR: `{base}/verify-certificate/{id}`.
pub fn verification_url(base_url: &str, registration_id: &str) -> String {
    format!(
        "{}/verify-certificate/{}",
        base_url.trim_end_matches('/'),
        registration_id
    )
}

/// Render the URL to a grayscale square image.
pub fn render(url: &str) -> Result<DynamicImage> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|err| PlatformError::render(format!("QR encoding failed: {err}")))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();

    let total_modules = modules + 2 * QUIET_ZONE_MODULES;
    let scale = (QR_PIXEL_SIZE / total_modules).max(1);
    let size = total_modules * scale;

    let mut img = GrayImage::from_pixel(size, size, Luma([255u8]));
    for my in 0..modules {
        for mx in 0..modules {
            if colors[(my * modules + mx) as usize] == Color::Dark {
                let px = (mx + QUIET_ZONE_MODULES) * scale;
                let py = (my + QUIET_ZONE_MODULES) * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(px + dx, py + dy, Luma([0u8]));
                    }
                }
            }
        }
    }

    Ok(DynamicImage::ImageLuma8(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_verification_url_shape() {
        assert_eq!(
            verification_url("http://localhost:5173", "reg-1"),
            "http://localhost:5173/verify-certificate/reg-1"
        );
        assert_eq!(
            verification_url("https://events.example.org/", "reg-1"),
            "https://events.example.org/verify-certificate/reg-1"
        );
    }

    #[test]
    fn test_render_is_square_within_bounds() {
        let img = render("http://localhost:5173/verify-certificate/reg-1").unwrap();
        let (w, h) = img.dimensions();
        assert_eq!(w, h);
        assert!(w <= QR_PIXEL_SIZE);
        assert!(w >= QR_PIXEL_SIZE / 2);
    }

    #[test]
    fn test_render_has_both_colors() {
        let img = render("http://localhost:5173/verify-certificate/reg-1")
            .unwrap()
            .to_luma8();
        let mut dark = false;
        let mut light = false;
        for p in img.pixels() {
            match p.0[0] {
                0 => dark = true,
                255 => light = true,
                _ => {}
            }
        }
        assert!(dark && light);
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render("http://localhost:5173/verify-certificate/reg-1").unwrap().to_luma8();
        let b = render("http://localhost:5173/verify-certificate/reg-1").unwrap().to_luma8();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
