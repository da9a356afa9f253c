//! 商品画像の取得・デコード
//!
//! - Cloudinary配信URLは自動フォーマット・自動品質の変換指定を付けて取得する
//! - 取得失敗・デコード失敗はすべて `ImageUnavailable`（カード側でプレースホルダーに置き換える）
//! - 1ページ分の画像は同時実行数を制限して並列取得し、入力順で返す

use crate::cli::PdfQuality;
use crate::error::{CatalogueError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use futures::stream::{self, StreamExt};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use printpdf::RawImage;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// 受け付ける画像MIMEタイプ
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Cloudinaryの自動変換指定
const CLOUDINARY_AUTO: &str = "f_auto,q_auto";

/// 画像を利用できない（カード単位で回復する）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("画像を取得できません ({url}): {reason}")]
pub struct ImageUnavailable {
    pub url: String,
    pub reason: String,
}

impl ImageUnavailable {
    pub fn new(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================
// 取得
// ============================================

/// 画像バイト列の取得元
pub trait ImageFetcher: Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = std::result::Result<Vec<u8>, ImageUnavailable>> + Send;
}

/// HTTP取得（タイムアウト付き、リトライなし）
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("craft-catalogue/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogueError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, ImageUnavailable> {
        let target = normalize_image_url(url);
        if target != url {
            log::debug!("画像URLを変換: {} -> {}", url, target);
        }

        let response = self
            .client
            .get(&*target)
            .header(ACCEPT, ACCEPTED_IMAGE_TYPES.join(","))
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "タイムアウト".to_string()
                } else {
                    e.to_string()
                };
                ImageUnavailable::new(url, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageUnavailable::new(url, format!("HTTP {}", status)));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if !is_accepted_content_type(content_type) {
                return Err(ImageUnavailable::new(
                    url,
                    format!("画像ではないContent-Type: {}", content_type),
                ));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageUnavailable::new(url, e.to_string()))?;
        if bytes.is_empty() {
            return Err(ImageUnavailable::new(url, "空のレスポンス"));
        }
        Ok(bytes.to_vec())
    }
}

/// Cloudinary配信URLに自動フォーマット・自動品質の指定を挿入する
///
/// それ以外のURL、既に `f_` / `q_` 指定があるURLはそのまま返す。
pub fn normalize_image_url(url: &str) -> Cow<'_, str> {
    lazy_static::lazy_static! {
        static ref CLOUDINARY_UPLOAD: Regex =
            Regex::new(r"^(https?://res\.cloudinary\.com/[^/]+/image/upload/)(.+)$").unwrap();
    }

    let Some(caps) = CLOUDINARY_UPLOAD.captures(url) else {
        return Cow::Borrowed(url);
    };
    let prefix = &caps[1];
    let rest = &caps[2];

    let first_segment = rest.split('/').next().unwrap_or_default();
    let already_transformed = first_segment
        .split(',')
        .any(|t| t.starts_with("f_") || t.starts_with("q_"));
    if already_transformed {
        return Cow::Borrowed(url);
    }

    Cow::Owned(format!("{}{}/{}", prefix, CLOUDINARY_AUTO, rest))
}

/// Content-Typeが受け付けリストに含まれるか（パラメータは無視）
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_IMAGE_TYPES.contains(&mime.as_str())
}

/// `data:image/...;base64,...` を解釈する。data URIでなければ `None`
pub fn decode_data_uri(url: &str) -> Option<std::result::Result<Vec<u8>, ImageUnavailable>> {
    let rest = url.strip_prefix("data:")?;
    let result = match rest.split_once(',') {
        None => Err(ImageUnavailable::new(url, "data URIに区切り文字がありません")),
        Some((header, _)) if !header.contains(";base64") => {
            Err(ImageUnavailable::new(url, "base64以外のdata URIは未対応"))
        }
        Some((_, payload)) => BASE64_STD
            .decode(payload.trim())
            .map_err(|e| ImageUnavailable::new(url, format!("base64デコードエラー: {}", e))),
    };
    Some(result)
}

/// 画像バイト列を取得する（data URIはローカルで展開）
pub async fn fetch_image_bytes<F: ImageFetcher>(
    fetcher: &F,
    url: &str,
) -> std::result::Result<Vec<u8>, ImageUnavailable> {
    match decode_data_uri(url) {
        Some(result) => result,
        None => fetcher.fetch(url).await,
    }
}

// ============================================
// デコード
// ============================================

/// デコード済み画像
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
    /// 幅 / 高さ
    pub aspect_ratio: f64,
}

pub fn decode_image(url: &str, bytes: &[u8]) -> std::result::Result<LoadedImage, ImageUnavailable> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ImageUnavailable::new(url, format!("デコードエラー: {}", e)))?;
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ImageUnavailable::new(url, "画像サイズが0"));
    }
    Ok(LoadedImage {
        image,
        width,
        height,
        aspect_ratio: width as f64 / height as f64,
    })
}

/// 取得してデコードする
pub async fn load_image<F: ImageFetcher>(
    fetcher: &F,
    url: &str,
) -> std::result::Result<LoadedImage, ImageUnavailable> {
    let bytes = fetch_image_bytes(fetcher, url).await?;
    decode_image(url, &bytes)
}

/// PDF埋め込み用に縮小・再エンコードした画像
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub raw: RawImage,
    /// 埋め込み画像のピクセル寸法
    pub width_px: u32,
    pub height_px: u32,
    /// 元画像の縦横比
    pub aspect_ratio: f64,
}

/// 品質設定に合わせて縮小し、JPEGで再エンコードしてPDF用に変換する
pub fn prepare_for_pdf(
    url: &str,
    loaded: LoadedImage,
    quality: PdfQuality,
) -> std::result::Result<PreparedImage, ImageUnavailable> {
    let aspect_ratio = loaded.aspect_ratio;
    let image = if loaded.width > quality.max_width() {
        loaded.image.resize(quality.max_width(), u32::MAX, FilterType::Triangle)
    } else {
        loaded.image
    };
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let (width_px, height_px) = (rgb.width(), rgb.height());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality());
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageUnavailable::new(url, format!("JPEGエンコードエラー: {}", e)))?;

    let mut warnings = Vec::new();
    let raw = RawImage::decode_from_bytes(&jpeg, &mut warnings)
        .map_err(|e| ImageUnavailable::new(url, format!("PDF画像変換エラー: {}", e)))?;

    Ok(PreparedImage {
        raw,
        width_px,
        height_px,
        aspect_ratio,
    })
}

pub type ImageOutcome = std::result::Result<PreparedImage, ImageUnavailable>;

/// 複数URLを同時実行数を制限して取得する。結果は `urls` と同じ順序
pub async fn load_images<F: ImageFetcher>(
    fetcher: &F,
    urls: Vec<String>,
    quality: PdfQuality,
    concurrency: usize,
) -> Vec<ImageOutcome> {
    stream::iter(urls)
        .map(|url| async move {
            let loaded = load_image(fetcher, &url).await?;
            prepare_for_pdf(&url, loaded, quality)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
