//! PDFレポート（A4縦1ページ）
//!
//! ヘッダー帯 → 検査情報 → BEFORE/AFTER 画像枠 → 判定テーブル → 要約 → フッター
//!
//! 画像は縦横比を保って枠に埋め込む。デコードできない画像は文字で示す。

use super::ReportRenderer;
use crate::capture::decode_payload;
use crate::error::RenderError;
use milq_common::layout::*;
use milq_common::report::{
    format_timestamp, report_rows, summary_paragraph, FOOTER_LINES, REPORT_SUBTITLE, REPORT_TITLE,
};
use milq_common::{AdulterantStatus, OverallStatus, ResultSummary, TestResult};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::image_crate::{self, DynamicImage};
use printpdf::*;
use std::io::BufWriter;
use tracing::debug;

/// 1pt = 0.3528mm
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl ReportRenderer for PdfRenderer {
    fn render(&self, result: &TestResult) -> Result<Vec<u8>, RenderError> {
        generate_pdf(result)
    }
}

fn pdf_error(context: &str, e: impl std::fmt::Debug) -> RenderError {
    RenderError::Pdf(format!("{}: {:?}", context, e))
}

/// 描画ヘルパー（座標は上端からの mm）
struct Canvas {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Canvas {
    fn color(&self, (r, g, b): Rgb8) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            None,
        )));
    }

    fn text(&self, text: &str, size: f32, x: f32, top: f32, bold: bool, color: Rgb8) {
        self.color(color);
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(x), Mm(A4_HEIGHT_MM - top), font);
    }

    /// 画像枠（左上 x, top）に縦横比を保って収める
    fn image(&self, img: &DynamicImage, x: f32, top: f32) {
        let placement = fit_image(img.width(), img.height(), IMAGE_SLOT_WIDTH_MM, IMAGE_SLOT_HEIGHT_MM);
        if img.width() == 0 || img.height() == 0 {
            return;
        }
        let bottom = A4_HEIGHT_MM - (top + placement.offset_y_mm + placement.height_mm);
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(img.to_rgb8())).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x + placement.offset_x_mm)),
                translate_y: Some(Mm(bottom)),
                dpi: Some(img.width() as f32 * 25.4 / placement.width_mm),
                ..Default::default()
            },
        );
    }

    /// Helvetica の平均字幅で概算した中央寄せ
    fn text_centered(&self, text: &str, size: f32, center_x: f32, top: f32, bold: bool, color: Rgb8) {
        let width = text.chars().count() as f32 * size * 0.5 * PT_TO_MM;
        self.text(text, size, center_x - width / 2.0, top, bold, color);
    }

    fn rect(&self, x: f32, top: f32, width: f32, height: f32, color: Rgb8) {
        self.color(color);
        let bottom = A4_HEIGHT_MM - top - height;
        let ring = vec![
            (Point::new(Mm(x), Mm(bottom)), false),
            (Point::new(Mm(x + width), Mm(bottom)), false),
            (Point::new(Mm(x + width), Mm(bottom + height)), false),
            (Point::new(Mm(x), Mm(bottom + height)), false),
        ];
        self.layer.add_polygon(Polygon {
            rings: vec![ring],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }
}

fn status_color(status: OverallStatus) -> Rgb8 {
    match status {
        OverallStatus::Safe => SUCCESS_GREEN,
        OverallStatus::Unsafe => DANGER_RED,
        OverallStatus::Inconclusive => TEXT_SECONDARY,
    }
}

fn finding_color(status: AdulterantStatus) -> Rgb8 {
    match status {
        AdulterantStatus::Pass => SUCCESS_GREEN,
        AdulterantStatus::Detected => DANGER_RED,
        AdulterantStatus::Borderline => TEXT_SECONDARY,
    }
}

/// TestResult から PDF を生成
pub fn generate_pdf(result: &TestResult) -> Result<Vec<u8>, RenderError> {
    let (doc, page1, layer1) = PdfDocument::new(
        format!("{} {}", REPORT_TITLE, result.id),
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );

    let canvas = Canvas {
        layer: doc.get_page(page1).get_layer(layer1),
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_error("font", e))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_error("font", e))?,
    };

    draw_header(&canvas, result);
    let mut top = draw_info(&canvas, result, HEADER_HEIGHT_MM + 10.0);
    top = draw_images(&canvas, result, top + 6.0);
    top = draw_table(&canvas, result, top + 8.0);
    draw_summary(&canvas, result, top + 8.0);
    draw_footer(&canvas);

    let mut bytes = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|e| pdf_error("save", e))?;
    debug!(id = %result.id, bytes = bytes.len(), "pdf rendered");
    Ok(bytes)
}

fn draw_header(canvas: &Canvas, result: &TestResult) {
    canvas.rect(0.0, 0.0, A4_WIDTH_MM, HEADER_HEIGHT_MM, PRIMARY_BLUE);
    canvas.text(REPORT_TITLE, 20.0, MARGIN_MM, 12.0, true, WHITE);
    canvas.text(REPORT_SUBTITLE, 10.0, MARGIN_MM, 19.0, false, WHITE);

    let (date, time) = format_timestamp(&result.timestamp);
    let right = A4_WIDTH_MM - MARGIN_MM - 45.0;
    canvas.text(&format!("Date: {}", date), 9.0, right, 11.0, false, WHITE);
    canvas.text(&format!("Time: {}", time), 9.0, right, 16.0, false, WHITE);
}

fn draw_info(canvas: &Canvas, result: &TestResult, top: f32) -> f32 {
    let summary = ResultSummary::new(result);
    canvas.rect(MARGIN_MM, top - 6.0, TABLE_WIDTH_MM, 26.0, PANEL_BG);

    canvas.text("Test ID:", 10.0, MARGIN_MM + 4.0, top, true, TEXT_SECONDARY);
    canvas.text(&result.id, 10.0, MARGIN_MM + 30.0, top, false, TEXT_PRIMARY);
    canvas.text("Tag:", 10.0, MARGIN_MM + 4.0, top + 6.0, true, TEXT_SECONDARY);
    canvas.text(
        result.tag.as_deref().unwrap_or("-"),
        10.0,
        MARGIN_MM + 30.0,
        top + 6.0,
        false,
        TEXT_PRIMARY,
    );
    canvas.text("Score:", 10.0, MARGIN_MM + 4.0, top + 12.0, true, TEXT_SECONDARY);
    canvas.text(
        &format!("{}/5", result.overall_score),
        10.0,
        MARGIN_MM + 30.0,
        top + 12.0,
        false,
        TEXT_PRIMARY,
    );

    let right = MARGIN_MM + TABLE_WIDTH_MM / 2.0 + 10.0;
    canvas.text("Overall Status", 9.0, right, top, true, TEXT_SECONDARY);
    canvas.text(
        result.status.as_str(),
        16.0,
        right,
        top + 8.0,
        true,
        status_color(result.status),
    );
    canvas.text(&summary.headline(), 10.0, right, top + 14.0, false, TEXT_PRIMARY);

    top + 20.0
}

fn draw_images(canvas: &Canvas, result: &TestResult, top: f32) -> f32 {
    let slots = [
        ("BEFORE SAMPLE", result.before_image.as_deref()),
        ("AFTER REACTION", result.after_image.as_deref()),
    ];

    for (index, (caption, payload)) in slots.into_iter().enumerate() {
        let x = MARGIN_MM + index as f32 * (IMAGE_SLOT_WIDTH_MM + IMAGE_GAP_MM);
        canvas.text(caption, 9.0, x, top, true, TEXT_SECONDARY);

        let slot_top = top + 3.0;
        canvas.rect(x, slot_top, IMAGE_SLOT_WIDTH_MM, IMAGE_SLOT_HEIGHT_MM, PANEL_BG);

        let center_x = x + IMAGE_SLOT_WIDTH_MM / 2.0;
        let center_top = slot_top + IMAGE_SLOT_HEIGHT_MM / 2.0;
        match payload.map(decode_image) {
            Some(Some(img)) => canvas.image(&img, x, slot_top),
            Some(None) => {
                canvas.text_centered("Image unavailable", 8.0, center_x, center_top, false, TEXT_SECONDARY);
            }
            None => {
                canvas.text_centered("No image", 8.0, center_x, center_top, false, TEXT_SECONDARY);
            }
        }
    }

    top + 3.0 + IMAGE_SLOT_HEIGHT_MM
}

/// base64 / data URL を画像にデコード（失敗時は None）
fn decode_image(payload: &str) -> Option<DynamicImage> {
    let decoded = decode_payload(payload)
        .map_err(|e| e.to_string())
        .and_then(|bytes| image_crate::load_from_memory(&bytes).map_err(|e| e.to_string()));
    match decoded {
        Ok(img) => Some(img),
        Err(e) => {
            debug!("image slot left empty: {}", e);
            None
        }
    }
}

fn draw_table(canvas: &Canvas, result: &TestResult, top: f32) -> f32 {
    canvas.text("Chemical Screening", 12.0, MARGIN_MM, top, true, TEXT_PRIMARY);

    let header_top = top + 4.0;
    canvas.rect(MARGIN_MM, header_top, TABLE_WIDTH_MM, TABLE_ROW_HEIGHT_MM, PRIMARY_BLUE);
    let text_offset = TABLE_ROW_HEIGHT_MM - 2.5;
    for (label, x) in [
        ("Adulterant", COL_ADULTERANT_MM),
        ("Status", COL_STATUS_MM),
        ("Confidence", COL_CONFIDENCE_MM),
        ("Verdict", COL_VERDICT_MM),
    ] {
        canvas.text(label, 9.0, x, header_top + text_offset, true, WHITE);
    }

    let mut row_top = header_top + TABLE_ROW_HEIGHT_MM;
    for (index, (row, finding)) in report_rows(result).iter().zip(&result.results).enumerate() {
        if index % 2 == 1 {
            canvas.rect(MARGIN_MM, row_top, TABLE_WIDTH_MM, TABLE_ROW_HEIGHT_MM, ROW_ALT_BG);
        }
        let baseline = row_top + text_offset;
        let color = finding_color(finding.status);
        canvas.text(&row.adulterant, 9.0, COL_ADULTERANT_MM, baseline, false, TEXT_PRIMARY);
        canvas.text(row.status.as_str(), 9.0, COL_STATUS_MM, baseline, true, color);
        canvas.text(&row.confidence, 9.0, COL_CONFIDENCE_MM, baseline, false, TEXT_PRIMARY);
        let verdict_color = if finding.is_detected() { DANGER_RED } else { SUCCESS_GREEN };
        canvas.text(row.verdict, 9.0, COL_VERDICT_MM, baseline, true, verdict_color);
        row_top += TABLE_ROW_HEIGHT_MM;
    }

    row_top
}

fn draw_summary(canvas: &Canvas, result: &TestResult, top: f32) {
    canvas.text("Summary", 12.0, MARGIN_MM, top, true, TEXT_PRIMARY);

    let footer_top = A4_HEIGHT_MM - FOOTER_OFFSET_MM - 4.0;
    let mut line_top = top + 6.0;
    for line in wrap_text(&summary_paragraph(result), SUMMARY_WRAP_CHARS) {
        if line_top > footer_top {
            break;
        }
        canvas.text(&line, 8.0, MARGIN_MM, line_top, false, TEXT_PRIMARY);
        line_top += 4.0;
    }
}

fn draw_footer(canvas: &Canvas) {
    let mut top = A4_HEIGHT_MM - FOOTER_OFFSET_MM;
    for line in FOOTER_LINES {
        canvas.text_centered(line, 7.0, A4_WIDTH_MM / 2.0, top, false, TEXT_SECONDARY);
        top += 4.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use milq_common::{AnalysisFinding, Severity};

    fn sample() -> TestResult {
        TestResult {
            id: "MIL-0A1B2C3D4E5F".into(),
            tag: Some("Morning Batch".into()),
            timestamp: "2026-10-17T08:05:30.000Z".into(),
            overall_score: 2,
            status: OverallStatus::Unsafe,
            results: vec![AnalysisFinding {
                adulterant: "Starch".into(),
                status: AdulterantStatus::Detected,
                confidence: 91,
                action: Some("Reject".into()),
                color_change: "dark blue spots".into(),
                severity: Severity::High,
                recommendation: "Do not consume".into(),
                health_risk: Some("Digestive issues".into()),
            }],
            before_image: None,
            after_image: Some("data:image/jpeg;base64,bm90IGFuIGltYWdl".into()),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn jpeg_data_url(width: u32, height: u32) -> String {
        let img = ::image::DynamicImage::ImageRgb8(::image::RgbImage::from_pixel(
            width,
            height,
            ::image::Rgb([200, 210, 230]),
        ));
        let bytes = crate::capture::encode_jpeg(&img, 1568).unwrap();
        format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn test_generate_pdf_produces_document() {
        let bytes = generate_pdf(&sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // 壊れた画像は埋め込まない
        assert!(!contains(&bytes, b"/Image"));
    }

    #[test]
    fn test_generate_pdf_embeds_photos() {
        let mut result = sample();
        result.before_image = Some(jpeg_data_url(64, 48));
        result.after_image = Some(jpeg_data_url(40, 80));

        let bytes = generate_pdf(&result).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"/Image"));
    }
}
