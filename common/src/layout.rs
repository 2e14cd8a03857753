//! レポートレイアウト設定
//!
//! mm基準のレイアウト定義（A4縦, 1ページ）

// ============================================
// mm基準レイアウト
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 左右余白（mm）
pub const MARGIN_MM: f32 = 15.0;

/// ヘッダー帯の高さ（mm）
pub const HEADER_HEIGHT_MM: f32 = 24.0;

/// 画像スロット（BEFORE / AFTER を横に2つ）
pub const IMAGE_GAP_MM: f32 = 10.0;
pub const IMAGE_SLOT_WIDTH_MM: f32 = (A4_WIDTH_MM - MARGIN_MM * 2.0 - IMAGE_GAP_MM) / 2.0; // 85mm
pub const IMAGE_SLOT_HEIGHT_MM: f32 = 45.0;

/// 判定テーブル
pub const TABLE_ROW_HEIGHT_MM: f32 = 8.0;
pub const TABLE_WIDTH_MM: f32 = A4_WIDTH_MM - MARGIN_MM * 2.0;

/// テーブル列のX座標（mm, 左端から）
pub const COL_ADULTERANT_MM: f32 = 20.0;
pub const COL_STATUS_MM: f32 = 75.0;
pub const COL_CONFIDENCE_MM: f32 = 115.0;
pub const COL_VERDICT_MM: f32 = 150.0;

/// フッター（下端からの距離, mm）
pub const FOOTER_OFFSET_MM: f32 = 18.0;

/// 要約文の1行あたり文字数（8pt Helvetica 概算）
pub const SUMMARY_WRAP_CHARS: usize = 105;

// ============================================
// 色（RGB 0-255）
// ============================================

pub type Rgb8 = (u8, u8, u8);

pub const PRIMARY_BLUE: Rgb8 = (30, 136, 229);
pub const SUCCESS_GREEN: Rgb8 = (76, 175, 80);
pub const DANGER_RED: Rgb8 = (229, 57, 53);
pub const TEXT_PRIMARY: Rgb8 = (33, 37, 41);
pub const TEXT_SECONDARY: Rgb8 = (108, 117, 125);
pub const PANEL_BG: Rgb8 = (248, 249, 250);
pub const ROW_ALT_BG: Rgb8 = (245, 247, 250);
pub const WHITE: Rgb8 = (255, 255, 255);

// ============================================
// 画像配置
// ============================================

/// スロット内に画像をアスペクト比を保って収めた配置（mm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub width_mm: f32,
    pub height_mm: f32,
    pub offset_x_mm: f32,
    pub offset_y_mm: f32,
}

/// 幅基準で合わせ、高さがはみ出す場合は高さ基準に切り替えて中央寄せ
pub fn fit_image(width_px: u32, height_px: u32, slot_width_mm: f32, slot_height_mm: f32) -> ImagePlacement {
    let ratio = if width_px == 0 || height_px == 0 {
        1.0
    } else {
        width_px as f32 / height_px as f32
    };

    let mut width_mm = slot_width_mm;
    let mut height_mm = width_mm / ratio;
    if height_mm > slot_height_mm {
        height_mm = slot_height_mm;
        width_mm = height_mm * ratio;
    }

    ImagePlacement {
        width_mm,
        height_mm,
        offset_x_mm: (slot_width_mm - width_mm) / 2.0,
        offset_y_mm: (slot_height_mm - height_mm) / 2.0,
    }
}

/// 単語単位で折り返し
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_width() {
        assert!((IMAGE_SLOT_WIDTH_MM - 85.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_landscape_image_uses_full_width() {
        let placement = fit_image(1600, 900, 85.0, 45.0);
        assert!((placement.width_mm - 80.0).abs() < 0.01);
        assert!((placement.height_mm - 45.0).abs() < 0.01);
        assert!(placement.offset_x_mm > 0.0);
        assert_eq!(placement.offset_y_mm, 0.0);
    }

    #[test]
    fn test_fit_wide_image_centers_vertically() {
        let placement = fit_image(3400, 1000, 85.0, 45.0);
        assert!((placement.width_mm - 85.0).abs() < 0.01);
        assert!((placement.height_mm - 25.0).abs() < 0.01);
        assert!((placement.offset_y_mm - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_degenerate_image() {
        let placement = fit_image(0, 0, 40.0, 40.0);
        assert_eq!(placement.width_mm, 40.0);
        assert_eq!(placement.height_mm, 40.0);
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert!(wrap_text("", 10).is_empty());
    }
}
