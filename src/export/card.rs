//! 商品カードの描画
//!
//! 領域計算・文字列整形は `catalogue_common::export::card_core`、ここでは描画命令を積むだけ。

use super::canvas::{Align, EmbeddedImage, PageCanvas};
use super::context::RenderContext;
use catalogue_common::export::card_core::{
    build_card_text, story_max_lines, CardGeometry, CardTypography, MATERIALS_LABEL, MATERIALS_MAX_LINES,
    NAME_MAX_LINES, PRICE_BLOCK_LABEL,
};
use catalogue_common::layout::{fit_inside, pt_to_mm, Rect, CARD_FILL, PLACEHOLDER_FILL};
use catalogue_common::text::{line_height_mm, wrap_clamped, TextFont};
use catalogue_common::{LayoutType, ProductRecord};

const BORDER_PT: f64 = 0.6;
const DIVIDER_PT: f64 = 0.4;
const BLOCK_GAP_MM: f64 = 1.5;
const PLACEHOLDER_TEXT_PT: f64 = 7.0;
const PLACEHOLDER_THUMB_TEXT_PT: f64 = 4.5;

/// カード1枚分の描画結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardReport {
    pub placeholders: usize,
}

/// 行単位でテキストを積むカーソル
struct TextCursor {
    x: f64,
    y: f64,
}

impl TextCursor {
    /// 1行描いて行送り
    fn line(
        &mut self,
        canvas: &mut PageCanvas,
        text: &str,
        font: TextFont,
        size_pt: f64,
        color: [u8; 3],
    ) {
        // ベースラインは行の上端からフォントサイズ分下
        canvas.text(text, self.x, self.y + pt_to_mm(size_pt), font, size_pt, color, Align::Left);
        self.y += line_height_mm(size_pt);
    }
}

/// `images` は表示する画像（先頭がメイン）。`None` は取得できなかった画像
#[allow(clippy::too_many_arguments)]
pub fn render_card(
    ctx: &RenderContext,
    canvas: &mut PageCanvas,
    product: &ProductRecord,
    rect: Rect,
    slot_index: usize,
    layout: LayoutType,
    images: &[Option<EmbeddedImage>],
) -> CardReport {
    let palette = &ctx.palette;
    let mut report = CardReport::default();

    canvas.fill_rect(rect, CARD_FILL);
    canvas.stroke_rect(rect, palette.accent, BORDER_PT);

    let geometry = CardGeometry::compute(rect, slot_index, layout, images.len().max(1));

    let primary = images.first().and_then(Option::as_ref);
    if !draw_image_or_placeholder(ctx, canvas, primary, geometry.primary_frame, PLACEHOLDER_TEXT_PT) {
        report.placeholders += 1;
    }
    for (frame, image) in geometry.thumbnail_frames.iter().zip(images.iter().skip(1)) {
        if !draw_image_or_placeholder(ctx, canvas, image.as_ref(), *frame, PLACEHOLDER_THUMB_TEXT_PT) {
            report.placeholders += 1;
        }
    }

    draw_text_blocks(ctx, canvas, product, &geometry, rect.width, layout);
    report
}

/// 画像を描く。描けなかったらプレースホルダーを描いて `false`
fn draw_image_or_placeholder(
    ctx: &RenderContext,
    canvas: &mut PageCanvas,
    image: Option<&EmbeddedImage>,
    frame: Rect,
    text_pt: f64,
) -> bool {
    if let Some(image) = image {
        canvas.image(image, fit_inside(image.aspect_ratio, frame));
        return true;
    }

    canvas.fill_rect(frame, PLACEHOLDER_FILL);
    let line = line_height_mm(text_pt);
    let center_y = frame.center_y();
    canvas.text("Image", frame.center_x(), center_y, TextFont::Sans, text_pt, ctx.palette.muted, Align::Center);
    canvas.text(
        "Unavailable",
        frame.center_x(),
        center_y + line,
        TextFont::Sans,
        text_pt,
        ctx.palette.muted,
        Align::Center,
    );
    false
}

fn draw_text_blocks(
    ctx: &RenderContext,
    canvas: &mut PageCanvas,
    product: &ProductRecord,
    geometry: &CardGeometry,
    card_width: f64,
    layout: LayoutType,
) {
    let palette = &ctx.palette;
    let region = geometry.text_region;
    if region.width <= 0.0 || region.height <= 0.0 {
        return;
    }

    let typography = CardTypography::for_card(card_width, layout);
    let text = build_card_text(product, layout);
    let width = region.width;
    let mut cursor = TextCursor { x: region.x, y: region.y };

    for line in wrap_clamped(&text.name, TextFont::SerifBold, typography.name_pt, width, NAME_MAX_LINES) {
        cursor.line(canvas, &line, TextFont::SerifBold, typography.name_pt, palette.primary);
    }
    cursor.line(canvas, &text.tribe, TextFont::SerifItalic, typography.tribe_pt, palette.secondary);

    cursor.y += BLOCK_GAP_MM / 2.0;
    canvas.hline(region.x, region.right(), cursor.y, palette.accent, DIVIDER_PT);
    cursor.y += BLOCK_GAP_MM;

    cursor.line(canvas, MATERIALS_LABEL, TextFont::SansBold, typography.label_pt, palette.primary);
    for line in wrap_clamped(&text.materials, TextFont::Sans, typography.body_pt, width, MATERIALS_MAX_LINES) {
        cursor.line(canvas, &line, TextFont::Sans, typography.body_pt, palette.text);
    }
    cursor.y += BLOCK_GAP_MM;

    // 価格ブロックは下端に固定し、ストーリーは残りの高さに収める
    let mut price_block_height = line_height_mm(typography.label_pt)
        + line_height_mm(typography.size_pt)
        + line_height_mm(typography.price_pt);
    if text.stock.is_some() {
        price_block_height += line_height_mm(typography.stock_pt);
    }
    let price_top = region.bottom() - price_block_height;

    cursor.line(canvas, text.story_label, TextFont::SansBold, typography.label_pt, palette.primary);
    if !text.story.is_empty() {
        let remaining = price_top - BLOCK_GAP_MM - cursor.y;
        let max_lines = story_max_lines(remaining, line_height_mm(typography.body_pt));
        for line in wrap_clamped(&text.story, TextFont::Serif, typography.body_pt, width, max_lines) {
            cursor.line(canvas, &line, TextFont::Serif, typography.body_pt, palette.text);
        }
    }

    let mut price = TextCursor { x: region.x, y: price_top };
    price.line(canvas, PRICE_BLOCK_LABEL, TextFont::SansBold, typography.label_pt, palette.muted);
    price.line(canvas, &text.size, TextFont::Sans, typography.size_pt, palette.text);
    price.line(canvas, &text.price, TextFont::SansBold, typography.price_pt, palette.primary);
    if let Some(stock) = &text.stock {
        price.line(canvas, stock, TextFont::Sans, typography.stock_pt, palette.secondary);
    }
}
