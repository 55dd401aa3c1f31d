//! Certificate generation service implementation
//!
//! Renders the A4 landscape certificate PDF: optional background image,
//! centered title/subtitle and student lines, issue date, and a QR code
//! in the bottom-right corner pointing at the public validation URL.

use std::io::Cursor;
use chrono::{DateTime, Datelike, Utc};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon, Rgb,
    path::{PaintMode, WindingOrder},
};
use qrcode::{EcLevel, QrCode};
use tracing::{warn, debug};
use crate::config::settings::Settings;
use crate::utils::errors::{AdmissioError, Result};

/// A4 landscape page size
pub const A4_LANDSCAPE_WIDTH_MM: f64 = 297.0;
pub const A4_LANDSCAPE_HEIGHT_MM: f64 = 210.0;

/// Minimum pixel dimensions for an uploaded background image
pub const MIN_BACKGROUND_WIDTH: u32 = 1122;
pub const MIN_BACKGROUND_HEIGHT: u32 = 793;

const QR_SIZE_MM: f64 = 42.0;
const QR_MARGIN_MM: f64 = 11.0;
const PT_TO_MM: f64 = 0.352_778;

/// Everything needed to render one certificate
#[derive(Debug, Clone)]
pub struct CertificateData {
    pub student_name: String,
    pub course_name: String,
    pub issued_at: DateTime<Utc>,
    pub certificate_code: String,
    pub public_url: String,
    /// Raw bytes of the configured background image, when any
    pub background_image: Option<Vec<u8>>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub signature_line: Option<String>,
}

/// Certificate generation service
#[derive(Debug, Clone)]
pub struct CertificateService {
    settings: Settings,
}

impl CertificateService {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Public validation URL embedded in the QR code
    pub fn build_public_url(&self, certificate_code: &str) -> String {
        format!(
            "{}/certificados/validar/{}",
            self.settings.server.base_url.trim_end_matches('/'),
            certificate_code
        )
    }

    /// Check if certificate issuing is enabled
    pub fn is_enabled(&self) -> bool {
        self.settings.features.certificate_issuing
    }

    /// Render the certificate PDF
    pub fn generate_pdf(&self, data: &CertificateData) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            "Certificado",
            Mm(A4_LANDSCAPE_WIDTH_MM as f32),
            Mm(A4_LANDSCAPE_HEIGHT_MM as f32),
            "Layer 1",
        );
        let layer = doc.get_page(page).get_layer(layer);

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AdmissioError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AdmissioError::Pdf(e.to_string()))?;

        if let Some(bytes) = &data.background_image {
            // A broken background degrades to a plain certificate
            if let Err(e) = embed_background(&layer, bytes) {
                warn!(error = %e, "Failed to embed certificate background, continuing without it");
            }
        }

        let title = data.title.as_deref().unwrap_or("CERTIFICADO");
        set_fill(&layer, 0.0, 0.0, 0.0);
        draw_centered(&layer, &bold, title, 48.0, A4_LANDSCAPE_HEIGHT_MM - 42.0);

        if let Some(subtitle) = &data.subtitle {
            set_fill(&layer, 0.3, 0.3, 0.3);
            draw_centered(&layer, &font, subtitle, 24.0, A4_LANDSCAPE_HEIGHT_MM - 56.0);
        }

        set_fill(&layer, 0.0, 0.0, 0.0);
        let main_text = format!("Certificamos que {}", data.student_name);
        draw_centered(&layer, &font, &main_text, 20.0, A4_LANDSCAPE_HEIGHT_MM - 88.0);

        let course_text = format!("concluiu o curso: {}", data.course_name);
        draw_centered(&layer, &font, &course_text, 18.0, A4_LANDSCAPE_HEIGHT_MM - 102.0);

        set_fill(&layer, 0.4, 0.4, 0.4);
        let date_text = format!("Emitido em {}", format_date_pt_br(data.issued_at));
        draw_centered(&layer, &font, &date_text, 14.0, 63.0);

        if let Some(signature) = &data.signature_line {
            set_fill(&layer, 0.2, 0.2, 0.2);
            draw_centered(&layer, &font, signature, 12.0, 49.0);
        }

        let qr_x = A4_LANDSCAPE_WIDTH_MM - QR_SIZE_MM - QR_MARGIN_MM;
        let qr_y = QR_MARGIN_MM;
        match QrCode::with_error_correction_level(data.public_url.as_bytes(), EcLevel::M) {
            Ok(code) => {
                debug!(url = %data.public_url, "QR code generated");
                draw_qr_code(&layer, &code, qr_x, qr_y, QR_SIZE_MM);

                set_outline(&layer, 0.5, 0.5, 0.5, 0.35);
                draw_rect_outline(&layer, qr_x - 1.0, qr_y - 1.0, QR_SIZE_MM + 2.0, QR_SIZE_MM + 2.0);

                set_fill(&layer, 0.2, 0.2, 0.2);
                draw_centered_at(&layer, &font, "Validar Certificado", 9.0, qr_x + QR_SIZE_MM / 2.0, qr_y - 6.0);

                let url_text = shorten_url(&data.public_url);
                set_fill(&layer, 0.4, 0.4, 0.4);
                draw_centered_at(&layer, &font, &url_text, 6.0, qr_x + QR_SIZE_MM / 2.0, qr_y - 9.5);
            }
            Err(e) => {
                warn!(error = %e, url = %data.public_url, "Failed to generate QR code, drawing placeholder");
                set_fill(&layer, 0.9, 0.9, 0.9);
                draw_filled_rect(&layer, qr_x, qr_y, QR_SIZE_MM, QR_SIZE_MM);
                set_outline(&layer, 0.5, 0.5, 0.5, 0.7);
                draw_rect_outline(&layer, qr_x, qr_y, QR_SIZE_MM, QR_SIZE_MM);
                set_fill(&layer, 0.5, 0.5, 0.5);
                draw_centered_at(&layer, &font, "QR indisponivel", 10.0, qr_x + QR_SIZE_MM / 2.0, qr_y + QR_SIZE_MM / 2.0);
            }
        }

        doc.save_to_bytes().map_err(|e| AdmissioError::Pdf(e.to_string()))
    }
}

/// Dark modules drawn as filled squares over a white quiet zone
fn draw_qr_code(layer: &PdfLayerReference, code: &QrCode, x: f64, y: f64, size: f64) {
    set_fill(layer, 1.0, 1.0, 1.0);
    draw_filled_rect(layer, x - 1.5, y - 1.5, size + 3.0, size + 3.0);

    let width = code.width();
    let module = size / width as f64;
    let colors = code.to_colors();

    set_fill(layer, 0.0, 0.0, 0.0);
    for (index, color) in colors.iter().enumerate() {
        if *color == qrcode::Color::Dark {
            let col = index % width;
            let row = index / width;
            let mx = x + col as f64 * module;
            let my = y + size - (row as f64 + 1.0) * module;
            draw_filled_rect(layer, mx, my, module, module);
        }
    }
}

fn embed_background(layer: &PdfLayerReference, bytes: &[u8]) -> std::result::Result<(), String> {
    use printpdf::image_crate::codecs::{jpeg::JpegDecoder, png::PngDecoder};

    let image = if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Image::try_from(PngDecoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?)
            .map_err(|e| e.to_string())?
    } else {
        Image::try_from(JpegDecoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?)
            .map_err(|e| e.to_string())?
    };

    let dpi = 300.0;
    let width_mm = image.image.width.0 as f64 * 25.4 / dpi;
    let height_mm = image.image.height.0 as f64 * 25.4 / dpi;
    if width_mm <= 0.0 || height_mm <= 0.0 {
        return Err("image has no dimensions".to_string());
    }

    // Scale up to cover the whole page
    let scale = (A4_LANDSCAPE_WIDTH_MM / width_mm).max(A4_LANDSCAPE_HEIGHT_MM / height_mm);
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            rotate: None,
            scale_x: Some(scale as f32),
            scale_y: Some(scale as f32),
            dpi: Some(dpi as f32),
        },
    );

    Ok(())
}

fn set_fill(layer: &PdfLayerReference, r: f64, g: f64, b: f64) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None)));
}

fn set_outline(layer: &PdfLayerReference, r: f64, g: f64, b: f64, thickness: f64) {
    layer.set_outline_color(Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None)));
    layer.set_outline_thickness(thickness as f32);
}

fn draw_filled_rect(layer: &PdfLayerReference, x: f64, y: f64, w: f64, h: f64) {
    let polygon = Polygon {
        rings: vec![vec![
            (Point::new(Mm(x as f32), Mm(y as f32)), false),
            (Point::new(Mm((x + w) as f32), Mm(y as f32)), false),
            (Point::new(Mm((x + w) as f32), Mm((y + h) as f32)), false),
            (Point::new(Mm(x as f32), Mm((y + h) as f32)), false),
        ]],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    };
    layer.add_polygon(polygon);
}

fn draw_rect_outline(layer: &PdfLayerReference, x: f64, y: f64, w: f64, h: f64) {
    let line = Line {
        points: vec![
            (Point::new(Mm(x as f32), Mm(y as f32)), false),
            (Point::new(Mm((x + w) as f32), Mm(y as f32)), false),
            (Point::new(Mm((x + w) as f32), Mm((y + h) as f32)), false),
            (Point::new(Mm(x as f32), Mm((y + h) as f32)), false),
        ],
        is_closed: true,
    };
    layer.add_line(line);
}

fn draw_centered(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size_pt: f64, y: f64) {
    draw_centered_at(layer, font, text, size_pt, A4_LANDSCAPE_WIDTH_MM / 2.0, y);
}

fn draw_centered_at(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size_pt: f64,
    center_x: f64,
    y: f64,
) {
    let width = approx_text_width_mm(text, size_pt);
    layer.use_text(text, size_pt as f32, Mm((center_x - width / 2.0) as f32), Mm(y as f32), font);
}

/// Approximate Helvetica line width; good enough for centering
pub(crate) fn approx_text_width_mm(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * 0.5 * PT_TO_MM
}

/// Issue date in Brazilian long form, e.g. "06 de agosto de 2026"
pub(crate) fn format_date_pt_br(date: DateTime<Utc>) -> String {
    const MONTHS: [&str; 12] = [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho",
        "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
    ];
    let month = MONTHS[(date.month0() % 12) as usize];
    format!("{:02} de {} de {}", date.day(), month, date.year())
}

fn shorten_url(url: &str) -> String {
    let stripped = url.trim_start_matches("https://").trim_start_matches("http://");
    if stripped.chars().count() > 30 {
        let prefix: String = stripped.chars().take(30).collect();
        format!("{}...", prefix)
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_data() -> CertificateData {
        CertificateData {
            student_name: "Maria Silva".to_string(),
            course_name: "Engenharia de Software".to_string(),
            issued_at: Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap(),
            certificate_code: "ABC123-XYZ789".to_string(),
            public_url: "http://localhost:8080/certificados/validar/ABC123-XYZ789".to_string(),
            background_image: None,
            title: None,
            subtitle: Some("Processo Seletivo 2026".to_string()),
            signature_line: Some("Coordenação Acadêmica".to_string()),
        }
    }

    #[test]
    fn test_generate_pdf_produces_document() {
        let service = CertificateService::new(Settings::default());
        let bytes = service.generate_pdf(&sample_data()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_broken_background_degrades_gracefully() {
        let service = CertificateService::new(Settings::default());
        let mut data = sample_data();
        data.background_image = Some(b"definitely not an image".to_vec());
        let bytes = service.generate_pdf(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_build_public_url() {
        let mut settings = Settings::default();
        settings.server.base_url = "https://admissio.example/".to_string();
        let service = CertificateService::new(settings);
        assert_eq!(
            service.build_public_url("CODE-1"),
            "https://admissio.example/certificados/validar/CODE-1"
        );
    }

    #[test]
    fn test_format_date_pt_br() {
        let date = Utc.with_ymd_and_hms(2026, 8, 6, 0, 0, 0).unwrap();
        assert_eq!(format_date_pt_br(date), "06 de agosto de 2026");
    }

    #[test]
    fn test_shorten_url() {
        assert_eq!(shorten_url("http://a.b/c"), "a.b/c");
        let long = format!("https://example.com/{}", "x".repeat(60));
        let short = shorten_url(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 33);
    }

    #[test]
    fn test_text_width_grows_with_size() {
        let narrow = approx_text_width_mm("abc", 10.0);
        let wide = approx_text_width_mm("abc", 20.0);
        assert!(wide > narrow);
    }
}
