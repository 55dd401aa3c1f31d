//! Contract generation service implementation
//!
//! Takes the contract template from the step configuration, substitutes
//! `{{tag}}` values and `{{#tag}}...{{/tag}}` conditional blocks from the
//! registration data, and renders a flowed A4 PDF with an optional drawn
//! signature image.

use std::io::Cursor;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rgb,
};
use regex::Regex;
use tracing::warn;
use crate::services::certificate::approx_text_width_mm;
use crate::utils::errors::{AdmissioError, Result};

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 18.0;
const LINE_HEIGHT_MM: f64 = 5.0;
const BODY_SIZE_PT: f64 = 10.0;
const CLAUSE_SIZE_PT: f64 = 12.0;

const DEFAULT_TITLE: &str = "CONTRATO DE INSCRIÇÃO EM PROCESSO SELETIVO";

/// Template used when the contract step carries no `contractText` config
pub const DEFAULT_CONTRACT_TEMPLATE: &str = "\
CONTRATO DE INSCRIÇÃO EM PROCESSO SELETIVO

Cláusula 1 - Das partes
Eu, {{nome}}{{#cpf}}, portador(a) do CPF {{cpf}}{{/cpf}}{{#email}}, e-mail {{email}}{{/email}}, \
declaro estar de acordo com as condições do processo seletivo ao qual estou me inscrevendo.

Cláusula 2 - Da inscrição
A inscrição somente será considerada efetivada após o envio de todos os documentos \
obrigatórios e a conclusão de todas as etapas do processo.

Cláusula 3 - Da veracidade das informações
Declaro que todas as informações prestadas neste processo são verdadeiras, sob pena \
de cancelamento da inscrição.

Assinado em {{data}}.

________________________________
";

/// Substitute template tags with registration data.
///
/// Conditional blocks are kept only when the key holds a non-empty value;
/// `{{data}}` falls back to the current date when not supplied.
pub fn replace_contract_tags(text: &str, data: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut result = text.to_string();

    let open_re = Regex::new(r"\{\{#(\w+)\}\}").expect("static regex");
    loop {
        let (open_start, content_start, key) = match open_re.captures(&result) {
            Some(caps) => {
                let open = caps.get(0).expect("whole match");
                (open.start(), open.end(), caps.get(1).expect("key group").as_str().to_string())
            }
            None => break,
        };

        let close_tag = format!("{{{{/{}}}}}", key);
        let Some(rel) = result[content_start..].find(&close_tag) else {
            // Unbalanced block, leave the template untouched
            break;
        };
        let content_end = content_start + rel;
        let block_end = content_end + close_tag.len();

        let keep = data.get(&key).map(value_is_present).unwrap_or(false);
        let replacement = if keep {
            result[content_start..content_end].to_string()
        } else {
            String::new()
        };
        result.replace_range(open_start..block_end, &replacement);
    }

    for (key, value) in data {
        let tag = format!("{{{{{}}}}}", key);
        result = result.replace(&tag, &value_text(value));
    }

    if !data.contains_key("data") {
        let today = Utc::now().format("%d/%m/%Y").to_string();
        result = result.replace("{{data}}", &today);
    }

    let squeeze_re = Regex::new(r"\n{3,}").expect("static regex");
    squeeze_re.replace_all(&result, "\n\n").into_owned()
}

/// Render the contract PDF from the already substituted text
pub fn generate_contract_pdf(
    contract_text: &str,
    data: &serde_json::Map<String, serde_json::Value>,
    signature_png_base64: Option<&str>,
) -> Result<Vec<u8>> {
    let processed = replace_contract_tags(contract_text, data);
    let lines: Vec<&str> = processed.lines().collect();

    let (doc, page, layer) = PdfDocument::new(
        "Contrato",
        Mm(PAGE_WIDTH_MM as f32),
        Mm(PAGE_HEIGHT_MM as f32),
        "Layer 1",
    );
    let mut current = doc.get_page(page).get_layer(layer);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AdmissioError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AdmissioError::Pdf(e.to_string()))?;

    let max_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    let title = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| l.starts_with("CONTRATO"))
        .unwrap_or(DEFAULT_TITLE);
    set_fill(&current, 0.0, 0.0, 0.0);
    for wrapped in wrap_words(title, 16.0, max_width) {
        let width = approx_text_width_mm(&wrapped, 16.0);
        current.use_text(wrapped.as_str(), 16.0, Mm(((PAGE_WIDTH_MM - width) / 2.0) as f32), Mm(y as f32), &bold);
        y -= LINE_HEIGHT_MM + 2.0;
    }
    y -= 8.0;

    for line in &lines {
        // Room for the signature block at the bottom of the last page
        if y < MARGIN_MM + 53.0 {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            set_fill(&current, 0.0, 0.0, 0.0);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
        }

        let trimmed = line.trim();

        if trimmed.starts_with("CONTRATO") {
            continue;
        }

        if trimmed.is_empty() {
            y -= LINE_HEIGHT_MM;
            continue;
        }

        if trimmed.starts_with("Cláusula") {
            y -= 3.0;
            for wrapped in wrap_words(trimmed, CLAUSE_SIZE_PT, max_width) {
                current.use_text(wrapped.as_str(), CLAUSE_SIZE_PT as f32, Mm(MARGIN_MM as f32), Mm(y as f32), &bold);
                y -= LINE_HEIGHT_MM + 1.0;
            }
            y -= 1.5;
            continue;
        }

        if trimmed.starts_with("________________") {
            y -= 7.0;
            set_outline(&current, 0.0, 0.0, 0.0, 0.35);
            draw_line(&current, MARGIN_MM + 35.0, y, MARGIN_MM + 105.0, y);
            y -= LINE_HEIGHT_MM + 3.5;
            continue;
        }

        for wrapped in wrap_words(trimmed, BODY_SIZE_PT, max_width) {
            current.use_text(wrapped.as_str(), BODY_SIZE_PT as f32, Mm(MARGIN_MM as f32), Mm(y as f32), &font);
            y -= LINE_HEIGHT_MM;
        }
        y -= 1.0;
    }

    if let Some(encoded) = signature_png_base64 {
        y -= 10.0;
        match decode_signature(encoded) {
            Ok(bytes) => match embed_signature(&current, &bytes, MARGIN_MM, y) {
                Ok(drawn_height) => y -= drawn_height + 7.0,
                Err(e) => warn!(error = %e, "Failed to embed signature image"),
            },
            Err(e) => warn!(error = %e, "Failed to decode signature image"),
        }
    }

    set_outline(&current, 0.0, 0.0, 0.0, 0.35);
    draw_line(&current, MARGIN_MM, y, MARGIN_MM + 70.0, y);

    set_fill(&current, 0.5, 0.5, 0.5);
    current.use_text("Assinatura", 9.0, Mm(MARGIN_MM as f32), Mm((y - 5.0) as f32), &font);

    let date_value = data
        .get("data")
        .map(value_text)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| Utc::now().format("%d/%m/%Y").to_string());
    current.use_text(format!("Data: {}", date_value), 9.0, Mm((MARGIN_MM + 88.0) as f32), Mm((y - 5.0) as f32), &font);

    doc.save_to_bytes().map_err(|e| AdmissioError::Pdf(e.to_string()))
}

/// Accepts a raw base64 payload or a `data:image/png;base64,` URL
fn decode_signature(encoded: &str) -> Result<Vec<u8>> {
    let payload = encoded.rsplit_once(',').map(|(_, p)| p).unwrap_or(encoded);
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AdmissioError::InvalidInput(format!("Invalid signature encoding: {}", e)))
}

/// Returns the drawn height in mm
fn embed_signature(
    layer: &PdfLayerReference,
    bytes: &[u8],
    x: f64,
    y: f64,
) -> std::result::Result<f64, String> {
    use printpdf::image_crate::codecs::png::PngDecoder;

    let image = Image::try_from(PngDecoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;

    let dpi = 96.0;
    let scale = 0.35;
    let height_mm = image.image.height.0 as f64 * 25.4 / dpi * scale;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x as f32)),
            translate_y: Some(Mm((y - height_mm) as f32)),
            rotate: None,
            scale_x: Some(scale as f32),
            scale_y: Some(scale as f32),
            dpi: Some(dpi as f32),
        },
    );

    Ok(height_mm)
}

fn wrap_words(text: &str, size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };

        if approx_text_width_mm(&candidate, size_pt) > max_width_mm && !line.is_empty() {
            lines.push(line);
            line = word.to_string();
        } else {
            line = candidate;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn draw_line(layer: &PdfLayerReference, x1: f64, y1: f64, x2: f64, y2: f64) {
    let line = Line {
        points: vec![
            (Point::new(Mm(x1 as f32), Mm(y1 as f32)), false),
            (Point::new(Mm(x2 as f32), Mm(y2 as f32)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn set_fill(layer: &PdfLayerReference, r: f64, g: f64, b: f64) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None)));
}

fn set_outline(layer: &PdfLayerReference, r: f64, g: f64, b: f64, thickness: f64) {
    layer.set_outline_color(Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None)));
    layer.set_outline_thickness(thickness as f32);
}

fn value_is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_plain_tag_substitution() {
        let d = data(&[("nome", serde_json::json!("Maria")), ("cpf", serde_json::json!("123"))]);
        let out = replace_contract_tags("Eu, {{nome}}, CPF {{cpf}}.", &d);
        assert_eq!(out, "Eu, Maria, CPF 123.");
    }

    #[test]
    fn test_missing_tag_left_in_place() {
        let d = data(&[]);
        let out = replace_contract_tags("Eu, {{nome}}.", &d);
        assert_eq!(out, "Eu, {{nome}}.");
    }

    #[test]
    fn test_conditional_block_kept_when_present() {
        let d = data(&[("email", serde_json::json!("a@b.c"))]);
        let out = replace_contract_tags("X{{#email}} Email: {{email}}{{/email}}Y", &d);
        assert_eq!(out, "X Email: a@b.cY");
    }

    #[test]
    fn test_conditional_block_dropped_when_empty() {
        let d = data(&[("email", serde_json::json!(""))]);
        let out = replace_contract_tags("X{{#email}} Email: {{email}}{{/email}}Y", &d);
        assert_eq!(out, "XY");
    }

    #[test]
    fn test_conditional_block_dropped_when_missing() {
        let d = data(&[]);
        let out = replace_contract_tags("X{{#email}}E{{/email}}Y", &d);
        assert_eq!(out, "XY");
    }

    #[test]
    fn test_default_date_substitution() {
        let d = data(&[]);
        let out = replace_contract_tags("Assinado em {{data}}.", &d);
        assert!(!out.contains("{{data}}"));
        let expected = Utc::now().format("%d/%m/%Y").to_string();
        assert!(out.contains(&expected));
    }

    #[test]
    fn test_blank_lines_squeezed() {
        let d = data(&[]);
        let out = replace_contract_tags("a\n\n\n\n\nb", &d);
        assert_eq!(out, "a\n\nb");
    }

    #[test]
    fn test_unbalanced_block_is_left_alone() {
        let d = data(&[("x", serde_json::json!("1"))]);
        let out = replace_contract_tags("A{{#x}}never closed", &d);
        assert_eq!(out, "A{{#x}}never closed");
    }

    #[test]
    fn test_wrap_words_respects_width() {
        let lines = wrap_words("um dois tres quatro cinco seis sete oito", 12.0, 30.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(approx_text_width_mm(line, 12.0) <= 30.0 + 12.0);
        }
    }

    #[test]
    fn test_generate_contract_pdf() {
        let d = data(&[("nome", serde_json::json!("Maria Silva"))]);
        let text = "CONTRATO DE TESTE\n\nCláusula 1 - Objeto\nEu, {{nome}}, concordo com os termos.\n\n________________________________\n";
        let bytes = generate_contract_pdf(text, &d, None).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_generate_contract_pdf_with_bad_signature() {
        // an undecodable signature must not fail the whole contract
        let d = data(&[]);
        let bytes = generate_contract_pdf("Texto.", &d, Some("data:image/png;base64,@@@")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_decode_signature_data_url() {
        let encoded = format!("data:image/png;base64,{}", STANDARD.encode(b"png-bytes"));
        assert_eq!(decode_signature(&encoded).unwrap(), b"png-bytes");
        assert_eq!(decode_signature(&STANDARD.encode(b"raw")).unwrap(), b"raw");
    }
}
