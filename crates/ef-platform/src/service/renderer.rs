//! Certificate Renderer
//!
//! Composites the template image, the participant text block, and the
//! verification QR into a single-page landscape PDF. The layout is a fixed
//! set of named slots on a fixed 842x595 pt canvas, so the artifact is
//! reproducible regardless of which host renders it. Any decode or encode
//! failure propagates as a render error; there is no retry here.

use image::GenericImageView;
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument, Pt};

use crate::error::{PlatformError, Result};

/// A4 landscape in points.
const PAGE_WIDTH_PT: f32 = 842.0;
const PAGE_HEIGHT_PT: f32 = 595.0;

const NAME_FONT_SIZE: f32 = 42.0;
const TITLE_FONT_SIZE: f32 = 22.0;
const DATE_FONT_SIZE: f32 = 14.0;

// Baselines measured from the page bottom; the name sits at roughly
// mid-page with the title and issue date stacked beneath it.
const NAME_BASELINE_PT: f32 = 290.0;
const TITLE_BASELINE_PT: f32 = 240.0;
const DATE_BASELINE_PT: f32 = 200.0;

/// QR slot: bottom-right corner, fixed margin from both edges.
const QR_SIZE_PT: f32 = 120.0;
const QR_MARGIN_PT: f32 = 40.0;

/// Everything the renderer needs; the orchestrator resolves and decodes all
/// of it up front so this stays pure CPU work.
pub struct CertificateArt {
    pub student_name: String,
    pub event_title: String,
    pub issue_date: String,
    pub template: image::DynamicImage,
    pub qr: image::DynamicImage,
}

/// Render the certificate to PDF bytes.
pub fn render_certificate_pdf(art: &CertificateArt) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Certificate of Participation",
        Mm::from(Pt(PAGE_WIDTH_PT.into())),
        Mm::from(Pt(PAGE_HEIGHT_PT.into())),
        "certificate",
    );
    let layer = doc.get_page(page).get_layer(layer);

    // Template full-bleed at the origin. With dpi pinned to 72 one source
    // pixel maps to one point, so the scale factors stretch the image to
    // exactly the page box.
    let (tw, th) = art.template.dimensions();
    if tw == 0 || th == 0 {
        return Err(PlatformError::render("Certificate template image is empty"));
    }
    let background = Image::from_dynamic_image(&art.template);
    background.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm::from(Pt(0.0))),
            translate_y: Some(Mm::from(Pt(0.0))),
            scale_x: Some((PAGE_WIDTH_PT / tw as f32).into()),
            scale_y: Some((PAGE_HEIGHT_PT / th as f32).into()),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    // QR above the template, anchored bottom-right.
    let (qw, qh) = art.qr.dimensions();
    if qw == 0 || qh == 0 {
        return Err(PlatformError::render("QR image is empty"));
    }
    let qr = Image::from_dynamic_image(&art.qr);
    qr.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm::from(Pt((PAGE_WIDTH_PT - QR_MARGIN_PT - QR_SIZE_PT).into()))),
            translate_y: Some(Mm::from(Pt(QR_MARGIN_PT.into()))),
            scale_x: Some((QR_SIZE_PT / qw as f32).into()),
            scale_y: Some((QR_SIZE_PT / qh as f32).into()),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| PlatformError::render(format!("Font load failed: {err}")))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| PlatformError::render(format!("Font load failed: {err}")))?;

    let title_line = format!("For participating in {}", art.event_title);
    let date_line = format!("Date: {}", art.issue_date);

    draw_centered(&layer, &art.student_name, NAME_FONT_SIZE, NAME_BASELINE_PT, &bold, true);
    draw_centered(&layer, &title_line, TITLE_FONT_SIZE, TITLE_BASELINE_PT, &regular, false);
    draw_centered(&layer, &date_line, DATE_FONT_SIZE, DATE_BASELINE_PT, &regular, false);

    doc.save_to_bytes()
        .map_err(|err| PlatformError::render(format!("PDF encoding failed: {err}")))
}

fn draw_centered(
    layer: &printpdf::PdfLayerReference,
    text: &str,
    size: f32,
    baseline_pt: f32,
    font: &printpdf::IndirectFontRef,
    bold: bool,
) {
    let width = metrics::text_width_pt(text, size, bold);
    let x = ((PAGE_WIDTH_PT - width) / 2.0).max(0.0);
    layer.use_text(
        text,
        size.into(),
        Mm::from(Pt(x.into())),
        Mm::from(Pt(baseline_pt.into())),
        font,
    );
}

/// Advance widths for the two builtin faces used on the certificate.
/// The PDF viewer supplies the glyphs for builtin fonts, so centering has
/// to be computed from the standard AFM metrics (1/1000 em units, WinAnsi
/// printable ASCII range). Characters outside the range fall back to a
/// typical advance.
mod metrics {
    const FALLBACK_WIDTH: u16 = 600;

    #[rustfmt::skip]
    const HELVETICA: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
        1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
        333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
        556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ];

    #[rustfmt::skip]
    const HELVETICA_BOLD: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
        975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
        333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
        611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ];

    pub fn text_width_pt(text: &str, size: f32, bold: bool) -> f32 {
        let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
        let total: u32 = text
            .chars()
            .map(|c| {
                (c as usize)
                    .checked_sub(0x20)
                    .and_then(|i| table.get(i))
                    .copied()
                    .unwrap_or(FALLBACK_WIDTH) as u32
            })
            .sum();
        total as f32 * size / 1000.0
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_width_scales_with_font_size() {
            let small = text_width_pt("Certificate", 14.0, false);
            let large = text_width_pt("Certificate", 42.0, false);
            assert!((large - small * 3.0).abs() < 0.001);
        }

        #[test]
        fn test_bold_face_is_wider() {
            assert!(text_width_pt("Participation", 22.0, true) > text_width_pt("Participation", 22.0, false));
        }

        #[test]
        fn test_non_ascii_uses_fallback() {
            assert!(text_width_pt("é", 10.0, false) > 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn sample_art() -> CertificateArt {
        let template = DynamicImage::ImageRgb8(RgbImage::from_pixel(420, 297, image::Rgb([240, 240, 255])));
        let qr = crate::service::qr::render("http://localhost:5173/verify-certificate/reg-1").unwrap();
        CertificateArt {
            student_name: "Ada Lovelace".to_string(),
            event_title: "Rust Systems Workshop".to_string(),
            issue_date: "January 5, 2026".to_string(),
            template,
            qr,
        }
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let bytes = render_certificate_pdf(&sample_art()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // embedded template + QR push this well past a bare page
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_render_embeds_both_images() {
        let art = sample_art();
        let with_images = render_certificate_pdf(&art).unwrap();

        let tiny = CertificateArt {
            template: DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]))),
            qr: DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]))),
            ..art
        };
        let without = render_certificate_pdf(&tiny).unwrap();
        assert!(with_images.len() > without.len());
    }
}
