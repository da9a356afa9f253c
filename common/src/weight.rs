//! コンテンツ量の推定
//!
//! 商品1件のテキスト量を重み付き文字数で見積もる。
//! ページレイアウト選択の目安であり、正確な占有面積ではない。

use crate::types::ProductRecord;

pub const NAME_FACTOR: f64 = 1.5;
pub const TRIBE_FACTOR: f64 = 1.2;
pub const MATERIALS_FACTOR: f64 = 1.0;
pub const STORY_FACTOR: f64 = 1.0;

/// 素材リストの連結区切り
pub const MATERIALS_SEPARATOR: &str = ", ";

/// 商品のコンテンツ量
pub fn content_weight(product: &ProductRecord) -> f64 {
    let name = product.name.chars().count() as f64;
    let tribe = product.tribe.as_str().chars().count() as f64;
    let materials = product.materials.join(MATERIALS_SEPARATOR).chars().count() as f64;
    let story = product.story.chars().count() as f64;

    NAME_FACTOR * name + TRIBE_FACTOR * tribe + MATERIALS_FACTOR * materials + STORY_FACTOR * story
}

/// 平均コンテンツ量（空なら0）
pub fn mean_weight(products: &[ProductRecord]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(content_weight).sum::<f64>() / products.len() as f64
}
