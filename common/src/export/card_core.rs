//! 商品カードの計算部分（描画なし）
//!
//! カード矩形から画像領域・サムネイル枠・テキスト領域を割り出し、
//! カードに載せる文字列を整形する。PDFへの描画はCLI側の card モジュールが行う。

use crate::layout::Rect;
use crate::planner::LayoutType;
use crate::types::{Dimensions, Price, ProductRecord};
use crate::weight::MATERIALS_SEPARATOR;

// ============================================
// カード寸法（mm）
// ============================================

/// カード内側の余白
pub const CARD_PADDING_MM: f64 = 2.0;
/// 画像とテキストの間隔
pub const IMAGE_TEXT_GAP_MM: f64 = 3.0;
/// 上配置時の画像領域の高さ比
pub const TOP_IMAGE_FRACTION_FEATURED: f64 = 0.5;
pub const TOP_IMAGE_FRACTION_GRID: f64 = 0.42;
/// 左右配置時の画像領域の幅比・高さ比
pub const SIDE_IMAGE_FRACTION: f64 = 0.45;
pub const SIDE_IMAGE_HEIGHT_FRACTION: f64 = 0.6;

/// 追加画像があるときのメイン画像の高さ比
pub const PRIMARY_IMAGE_SHARE: f64 = 0.75;
pub const MAX_THUMBNAILS: usize = 3;
pub const THUMBNAIL_GAP_MM: f64 = 2.0;

/// これより狭いカードは文字を縮小する
pub const COMPACT_CARD_WIDTH_MM: f64 = 60.0;

// ============================================
// 配置計算
// ============================================

/// 画像の配置
///
/// 2列レイアウトは左右交互（偶数スロットが左）、それ以外は上。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePlacement {
    Top,
    Left,
    Right,
}

/// カード内の領域割り当て
#[derive(Debug, Clone, PartialEq)]
pub struct CardGeometry {
    pub placement: ImagePlacement,
    pub image_region: Rect,
    pub primary_frame: Rect,
    pub thumbnail_frames: Vec<Rect>,
    pub text_region: Rect,
}

impl CardGeometry {
    pub fn compute(card: Rect, slot_index: usize, layout: LayoutType, image_count: usize) -> Self {
        let inner = card.inset(CARD_PADDING_MM);

        let placement = match layout {
            LayoutType::TwoColumn if slot_index % 2 == 0 => ImagePlacement::Left,
            LayoutType::TwoColumn => ImagePlacement::Right,
            LayoutType::Featured | LayoutType::ThreeColumn => ImagePlacement::Top,
        };

        let (image_region, text_region) = match placement {
            ImagePlacement::Top => {
                let fraction = if layout == LayoutType::Featured {
                    TOP_IMAGE_FRACTION_FEATURED
                } else {
                    TOP_IMAGE_FRACTION_GRID
                };
                let image = Rect::new(inner.x, inner.y, inner.width, inner.height * fraction);
                let text_top = image.bottom() + IMAGE_TEXT_GAP_MM;
                let text = Rect::new(inner.x, text_top, inner.width, (inner.bottom() - text_top).max(0.0));
                (image, text)
            }
            ImagePlacement::Left => {
                let width = inner.width * SIDE_IMAGE_FRACTION;
                let image = Rect::new(inner.x, inner.y, width, inner.height * SIDE_IMAGE_HEIGHT_FRACTION);
                let text_left = image.right() + IMAGE_TEXT_GAP_MM;
                let text = Rect::new(text_left, inner.y, (inner.right() - text_left).max(0.0), inner.height);
                (image, text)
            }
            ImagePlacement::Right => {
                let width = inner.width * SIDE_IMAGE_FRACTION;
                let image = Rect::new(
                    inner.right() - width,
                    inner.y,
                    width,
                    inner.height * SIDE_IMAGE_HEIGHT_FRACTION,
                );
                let text = Rect::new(
                    inner.x,
                    inner.y,
                    (inner.width - width - IMAGE_TEXT_GAP_MM).max(0.0),
                    inner.height,
                );
                (image, text)
            }
        };

        let thumbnails = image_count.saturating_sub(1).min(MAX_THUMBNAILS);
        let (primary_frame, thumbnail_frames) = if thumbnails == 0 {
            (image_region, Vec::new())
        } else {
            let primary = Rect::new(
                image_region.x,
                image_region.y,
                image_region.width,
                image_region.height * PRIMARY_IMAGE_SHARE,
            );
            // 枚数に関係なく3枠分の幅で揃える
            let thumb_width = (image_region.width - THUMBNAIL_GAP_MM * (MAX_THUMBNAILS as f64 - 1.0))
                / MAX_THUMBNAILS as f64;
            let thumb_top = primary.bottom() + THUMBNAIL_GAP_MM;
            let thumb_height = (image_region.bottom() - thumb_top).max(0.0);
            let frames = (0..thumbnails)
                .map(|i| {
                    Rect::new(
                        image_region.x + i as f64 * (thumb_width + THUMBNAIL_GAP_MM),
                        thumb_top,
                        thumb_width.max(0.0),
                        thumb_height,
                    )
                })
                .collect();
            (primary, frames)
        };

        Self {
            placement,
            image_region,
            primary_frame,
            thumbnail_frames,
            text_region,
        }
    }
}

// ============================================
// 文字サイズ
// ============================================

/// カード内の文字サイズ（pt）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTypography {
    pub name_pt: f64,
    pub tribe_pt: f64,
    pub label_pt: f64,
    pub body_pt: f64,
    pub size_pt: f64,
    pub price_pt: f64,
    pub stock_pt: f64,
}

impl CardTypography {
    const BASE: CardTypography = CardTypography {
        name_pt: 11.0,
        tribe_pt: 8.0,
        label_pt: 7.0,
        body_pt: 7.0,
        size_pt: 8.0,
        price_pt: 9.0,
        stock_pt: 6.0,
    };

    /// カード幅とレイアウトから倍率を決める
    pub fn for_card(card_width_mm: f64, layout: LayoutType) -> Self {
        let scale = if layout == LayoutType::Featured {
            1.3
        } else if card_width_mm < COMPACT_CARD_WIDTH_MM {
            0.85
        } else {
            1.0
        };
        Self::BASE.scaled(scale)
    }

    fn scaled(&self, scale: f64) -> Self {
        Self {
            name_pt: self.name_pt * scale,
            tribe_pt: self.tribe_pt * scale,
            label_pt: self.label_pt * scale,
            body_pt: self.body_pt * scale,
            size_pt: self.size_pt * scale,
            price_pt: self.price_pt * scale,
            stock_pt: self.stock_pt * scale,
        }
    }
}

// ============================================
// カードの文字列
// ============================================

/// カードに表示する文字列一式
#[derive(Debug, Clone, PartialEq)]
pub struct CardText {
    pub name: String,
    pub tribe: String,
    pub materials: String,
    pub story_label: &'static str,
    pub story: String,
    pub size: String,
    pub price: String,
    pub stock: Option<String>,
}

pub const NAME_MAX_LINES: usize = 2;
pub const MATERIALS_MAX_LINES: usize = 3;
pub const STORY_MIN_LINES: usize = 2;

pub const MATERIALS_LABEL: &str = "MATERIALS:";
pub const STORY_LABEL_FEATURED: &str = "STORY:";
pub const STORY_LABEL_GRID: &str = "NOTES:";
pub const PRICE_BLOCK_LABEL: &str = "SIZES & RETAIL PRICE";

/// カード文字列を構築
pub fn build_card_text(product: &ProductRecord, layout: LayoutType) -> CardText {
    let story_label = if layout == LayoutType::Featured {
        STORY_LABEL_FEATURED
    } else {
        STORY_LABEL_GRID
    };
    CardText {
        name: product.name.trim().to_uppercase(),
        tribe: product.tribe.to_string(),
        materials: product.materials.join(MATERIALS_SEPARATOR).to_uppercase(),
        story_label,
        story: product.story.trim().to_string(),
        size: format!("Size: {}", format_dimensions(product.dimensions.as_ref())),
        price: format_price(&product.price),
        stock: (product.stock_quantity > 0).then(|| format!("In Stock: {}", product.stock_quantity)),
    }
}

/// ストーリーの最大行数: 残り高さ ÷ 行送り（最低2行）
pub fn story_max_lines(remaining_height_mm: f64, line_height_mm: f64) -> usize {
    if line_height_mm <= 0.0 || !remaining_height_mm.is_finite() {
        return STORY_MIN_LINES;
    }
    let fit = (remaining_height_mm / line_height_mm).floor();
    if fit < STORY_MIN_LINES as f64 {
        STORY_MIN_LINES
    } else {
        fit as usize
    }
}

/// 寸法表記: `L×W×H unit`、未入力なら `Standard`
pub fn format_dimensions(dimensions: Option<&Dimensions>) -> String {
    match dimensions {
        Some(dims) if !dims.is_empty() => {
            let part = |v: Option<f64>| v.map(format_decimal).unwrap_or_else(|| "-".to_string());
            format!(
                "{}×{}×{} {}",
                part(dims.length),
                part(dims.width),
                part(dims.height),
                dims.unit.as_str()
            )
        }
        _ => "Standard".to_string(),
    }
}

/// 価格表記: `THB 12,500`
pub fn format_price(price: &Price) -> String {
    format!("{} {}", price.currency.code(), format_amount(price.amount))
}

/// 3桁区切り、小数は2桁まで（末尾の0は省く）
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{}{}", sign, grouped)
    } else if fraction % 10 == 0 {
        format!("{}{}.{}", sign, grouped, fraction / 10)
    } else {
        format!("{}{}.{:02}", sign, grouped, fraction)
    }
}

/// 数値表記（小数2桁まで、末尾の0は省く）
fn format_decimal(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageGeometry;
    use crate::types::{Category, Currency, DimensionUnit, Tribe};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn product() -> ProductRecord {
        ProductRecord {
            id: "p1".to_string(),
            name: "  Embroidered Jacket ".to_string(),
            tribe: Tribe::Yao,
            category: Category::Clothing,
            story: "Cross-stitched over three months.".to_string(),
            materials: vec!["Cotton".to_string(), "Silk thread".to_string()],
            dimensions: Some(Dimensions {
                length: Some(70.0),
                width: Some(52.5),
                height: Some(1.0),
                unit: DimensionUnit::Cm,
            }),
            price: Price { amount: 12500.0, currency: Currency::Thb },
            images: vec!["https://example.com/1.jpg".to_string()],
            stock_quantity: 3,
            featured: false,
            created_at: None,
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(12500.0), "12,500");
        assert_eq!(format_amount(1234567.0), "1,234,567");
        assert_eq!(format_amount(1234.5), "1,234.5");
        assert_eq!(format_amount(19.99), "19.99");
        assert_eq!(format_amount(1000.004), "1,000");
    }

    #[test]
    fn test_format_dimensions() {
        let dims = product().dimensions;
        assert_eq!(format_dimensions(dims.as_ref()), "70×52.5×1 cm");
        assert_eq!(format_dimensions(None), "Standard");
        assert_eq!(format_dimensions(Some(&Dimensions::default())), "Standard");

        let partial = Dimensions {
            length: Some(10.0),
            width: Some(4.0),
            height: None,
            unit: DimensionUnit::Inch,
        };
        assert_eq!(format_dimensions(Some(&partial)), "10×4×- inch");
    }

    #[test]
    fn test_build_card_text() {
        let text = build_card_text(&product(), LayoutType::ThreeColumn);
        assert_eq!(text.name, "EMBROIDERED JACKET");
        assert_eq!(text.tribe, "Yao");
        assert_eq!(text.materials, "COTTON, SILK THREAD");
        assert_eq!(text.story_label, "NOTES:");
        assert_eq!(text.size, "Size: 70×52.5×1 cm");
        assert_eq!(text.price, "THB 12,500");
        assert_eq!(text.stock.as_deref(), Some("In Stock: 3"));

        let mut sold_out = product();
        sold_out.stock_quantity = 0;
        let text = build_card_text(&sold_out, LayoutType::Featured);
        assert_eq!(text.story_label, "STORY:");
        assert!(text.stock.is_none());
    }

    #[test]
    fn test_story_max_lines() {
        assert_eq!(story_max_lines(30.0, 3.0), 10);
        assert_eq!(story_max_lines(10.0, 3.0), 3);
        // 最低2行
        assert_eq!(story_max_lines(1.0, 3.0), 2);
        assert_eq!(story_max_lines(-5.0, 3.0), 2);
        assert_eq!(story_max_lines(10.0, 0.0), 2);
    }

    #[test]
    fn test_geometry_top_placement() {
        let card = Rect::new(15.0, 20.0, 56.0, 128.0);
        let geometry = CardGeometry::compute(card, 0, LayoutType::ThreeColumn, 1);
        assert_eq!(geometry.placement, ImagePlacement::Top);
        assert!(approx(geometry.image_region.height, (128.0 - 4.0) * TOP_IMAGE_FRACTION_GRID));
        assert_eq!(geometry.primary_frame, geometry.image_region);
        assert!(geometry.thumbnail_frames.is_empty());
        assert!(geometry.text_region.y > geometry.image_region.bottom());
        assert!(approx(geometry.text_region.bottom(), card.bottom() - CARD_PADDING_MM));
    }

    #[test]
    fn test_geometry_side_placement_alternates() {
        let card = Rect::new(0.0, 0.0, 87.5, 128.5);
        let left = CardGeometry::compute(card, 0, LayoutType::TwoColumn, 1);
        let right = CardGeometry::compute(card, 1, LayoutType::TwoColumn, 1);
        assert_eq!(left.placement, ImagePlacement::Left);
        assert_eq!(right.placement, ImagePlacement::Right);
        assert!(left.text_region.x > left.image_region.right());
        assert!(right.text_region.right() < right.image_region.x);
        assert!(approx(right.image_region.right(), card.right() - CARD_PADDING_MM));
        assert!(approx(left.image_region.height, (128.5 - 4.0) * SIDE_IMAGE_HEIGHT_FRACTION));
        // テキストはカードの高さいっぱい使う
        assert!(approx(left.text_region.bottom(), card.bottom() - CARD_PADDING_MM));
    }

    #[test]
    fn test_every_placement_reached_from_page_slots() {
        let page = PageGeometry::a4();
        let placements = |layout: LayoutType| -> Vec<ImagePlacement> {
            page.slot_rects(layout)
                .into_iter()
                .enumerate()
                .map(|(i, rect)| CardGeometry::compute(rect, i, layout, 1).placement)
                .collect()
        };

        assert_eq!(placements(LayoutType::Featured), vec![ImagePlacement::Top]);
        assert_eq!(
            placements(LayoutType::TwoColumn),
            vec![ImagePlacement::Left, ImagePlacement::Right, ImagePlacement::Left, ImagePlacement::Right]
        );
        assert!(placements(LayoutType::ThreeColumn).iter().all(|p| *p == ImagePlacement::Top));
        assert_eq!(placements(LayoutType::ThreeColumn).len(), 6);
    }

    #[test]
    fn test_geometry_thumbnails() {
        let card = Rect::new(0.0, 0.0, 80.0, 120.0);
        let geometry = CardGeometry::compute(card, 0, LayoutType::TwoColumn, 5);
        let region = geometry.image_region;
        assert_eq!(geometry.thumbnail_frames.len(), MAX_THUMBNAILS);
        assert!(approx(geometry.primary_frame.height, region.height * PRIMARY_IMAGE_SHARE));

        let widths: Vec<f64> = geometry.thumbnail_frames.iter().map(|r| r.width).collect();
        assert!(widths.iter().all(|w| approx(*w, widths[0])));
        let first = geometry.thumbnail_frames[0];
        let second = geometry.thumbnail_frames[1];
        assert!(approx(second.x - first.right(), THUMBNAIL_GAP_MM));
        assert!(approx(geometry.thumbnail_frames[2].right(), region.right()));
        assert!(approx(first.bottom(), region.bottom()));

        // 追加画像1枚でも同じ幅
        let single = CardGeometry::compute(card, 0, LayoutType::TwoColumn, 2);
        assert_eq!(single.thumbnail_frames.len(), 1);
        assert!(approx(single.thumbnail_frames[0].width, widths[0]));
    }

    #[test]
    fn test_typography_scales_with_width() {
        let geometry = PageGeometry::a4();
        let three = geometry.slot_rects(LayoutType::ThreeColumn)[0];
        let two = geometry.slot_rects(LayoutType::TwoColumn)[0];
        let featured = geometry.slot_rects(LayoutType::Featured)[0];

        let compact = CardTypography::for_card(three.width, LayoutType::ThreeColumn);
        let regular = CardTypography::for_card(two.width, LayoutType::TwoColumn);
        let large = CardTypography::for_card(featured.width, LayoutType::Featured);
        assert!(compact.name_pt < regular.name_pt);
        assert!(regular.name_pt < large.name_pt);
        assert!(approx(regular.price_pt, 9.0));
    }
}
