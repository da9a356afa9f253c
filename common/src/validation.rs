//! 商品レコードの検証
//!
//! 商品ストアのスキーマ規則（必須項目・文字数上限・画像枚数）を
//! 読み込み時に適用する。パイプラインは検証済みの入力のみを受け取る。

use crate::error::{Error, Result};
use crate::types::ProductRecord;

pub const NAME_MAX_CHARS: usize = 200;
pub const STORY_MAX_CHARS: usize = 2000;
pub const MIN_IMAGES: usize = 1;
pub const MAX_IMAGES: usize = 5;

/// 1商品分の検証結果
#[derive(Debug, Clone, PartialEq)]
pub struct ProductIssue {
    /// 入力中の位置（0始まり）
    pub index: usize,
    /// 商品ID（空なら商品名）
    pub label: String,
    pub messages: Vec<String>,
}

/// 1商品を検証し、違反メッセージを全て返す
pub fn check_product(product: &ProductRecord) -> Vec<String> {
    let mut messages = Vec::new();

    let name = product.name.trim();
    if name.is_empty() {
        messages.push("Product name is required".to_string());
    } else if name.chars().count() > NAME_MAX_CHARS {
        messages.push(format!("Product name cannot exceed {} characters", NAME_MAX_CHARS));
    }

    let story = product.story.trim();
    if story.is_empty() {
        messages.push("Product story is required".to_string());
    } else if story.chars().count() > STORY_MAX_CHARS {
        messages.push(format!("Story cannot exceed {} characters", STORY_MAX_CHARS));
    }

    if product.materials.is_empty() {
        messages.push("At least one material must be specified".to_string());
    } else if product.materials.iter().any(|m| m.trim().is_empty()) {
        messages.push("Materials cannot contain blank entries".to_string());
    }

    let images = product.images.len();
    if !(MIN_IMAGES..=MAX_IMAGES).contains(&images) {
        messages.push(format!(
            "Must have between {} and {} images",
            MIN_IMAGES, MAX_IMAGES
        ));
    } else if product.images.iter().any(|url| url.trim().is_empty()) {
        messages.push("Image URLs cannot be blank".to_string());
    }

    if let Some(dims) = &product.dimensions {
        let values = [
            ("length", dims.length),
            ("width", dims.width),
            ("height", dims.height),
        ];
        for (field, value) in values {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    messages.push(format!("Dimension {} cannot be negative", field));
                }
            }
        }
    }

    if !product.price.amount.is_finite() || product.price.amount < 0.0 {
        messages.push("Price cannot be negative".to_string());
    }

    messages
}

/// 商品一覧を検証し、違反のある商品のみ返す
pub fn validate_products(products: &[ProductRecord]) -> Vec<ProductIssue> {
    products
        .iter()
        .enumerate()
        .filter_map(|(index, product)| {
            let messages = check_product(product);
            if messages.is_empty() {
                None
            } else {
                Some(ProductIssue {
                    index,
                    label: product.label().to_string(),
                    messages,
                })
            }
        })
        .collect()
}

/// 違反があれば最初の商品の内容で `Error::Validation` を返す
pub fn ensure_valid(products: &[ProductRecord]) -> Result<()> {
    let issues = validate_products(products);
    match issues.first() {
        None => Ok(()),
        Some(first) => Err(Error::Validation(format!(
            "{}件の商品に不備があります。最初: #{} ({}): {}",
            issues.len(),
            first.index,
            first.label,
            first.messages.join("; ")
        ))),
    }
}
