//! 画像取り込み
//!
//! 撮影画像ファイルを縮小・JPEG再エンコードし、base64ペイロードにする。
//! 結果レコードには `data:image/jpeg;base64,...` 形式で保存する。

use crate::error::{MilqError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

pub const JPEG_MIME: &str = "image/jpeg";
const JPEG_QUALITY: u8 = 85;

lazy_static! {
    static ref DATA_URL_RE: Regex =
        Regex::new(r"^data:(?P<mime>[\w.+-]+/[\w.+-]+);base64,(?P<data>.*)$").unwrap();
}

/// 画像ファイルを読み込み、base64（JPEG）にする
pub fn load_image(path: &Path, max_size: u32) -> Result<String> {
    if !path.exists() {
        return Err(MilqError::FileNotFound(path.display().to_string()));
    }
    let img = image::open(path)
        .map_err(|e| MilqError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "image loaded");

    let bytes = encode_jpeg(&img, max_size)?;
    Ok(STANDARD.encode(bytes))
}

/// 長辺が max_size を超える場合のみ縮小して JPEG にエンコード
pub fn encode_jpeg(img: &DynamicImage, max_size: u32) -> Result<Vec<u8>> {
    let resized = if img.width() > max_size || img.height() > max_size {
        img.resize(max_size, max_size, FilterType::Triangle)
    } else {
        img.clone()
    };

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(resized.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))
        .map_err(|e| MilqError::ImageLoad(e.to_string()))?;
    Ok(buf)
}

/// data URL なら base64 部分だけを返す
pub fn strip_data_url(payload: &str) -> &str {
    match DATA_URL_RE.captures(payload).and_then(|c| c.name("data")) {
        Some(data) => data.as_str(),
        None => payload,
    }
}

/// 解析サービスへ渡す画像（MIME タイプ + 生の base64）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePayload<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

impl<'a> ImagePayload<'a> {
    /// data URL なら MIME を引き継ぐ。素の base64 は JPEG とみなす
    pub fn parse(payload: &'a str) -> Self {
        Self {
            mime_type: data_url_mime(payload).unwrap_or(JPEG_MIME),
            data: strip_data_url(payload),
        }
    }
}

/// base64 ペイロードを data URL にする（既に data URL ならそのまま）
pub fn to_data_url(payload: &str) -> String {
    if DATA_URL_RE.is_match(payload) {
        payload.to_string()
    } else {
        format!("data:{};base64,{}", JPEG_MIME, payload)
    }
}

/// data URL の MIME タイプ
pub fn data_url_mime(payload: &str) -> Option<&str> {
    DATA_URL_RE
        .captures(payload)
        .and_then(|c| c.name("mime"))
        .map(|m| m.as_str())
}

/// base64 / data URL をバイト列に戻す
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(strip_data_url(payload).trim())
        .map_err(|e| MilqError::ImageLoad(format!("invalid base64 image: {}", e)))
}

/// 画像のピクセルサイズ（デコードせずヘッダから取得）
pub fn image_dimensions(payload: &str) -> Result<(u32, u32)> {
    let bytes = decode_payload(payload)?;
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| MilqError::ImageLoad(e.to_string()))
}
