//! ページ描画キャンバス
//!
//! 左上原点・mm単位の座標で受け取り、printpdf の描画命令（PDFは左下原点・pt単位）に変換して積む。

use catalogue_common::layout::{mm_to_pt, Rect, RgbColor};
use catalogue_common::text::{text_width_mm, TextFont};
use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PaintMode, PdfPage, Point, Polygon, PolygonRing, Pt,
    Rgb, TextItem, WindingOrder, XObjectId, XObjectTransform,
};

/// 文字揃え
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// 埋め込み済み画像への参照
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub id: XObjectId,
    pub width_px: u32,
    pub height_px: u32,
    pub aspect_ratio: f64,
}

pub fn builtin_font(font: TextFont) -> BuiltinFont {
    match font {
        TextFont::Serif => BuiltinFont::TimesRoman,
        TextFont::SerifBold => BuiltinFont::TimesBold,
        TextFont::SerifItalic => BuiltinFont::TimesItalic,
        TextFont::Sans => BuiltinFont::Helvetica,
        TextFont::SansBold => BuiltinFont::HelveticaBold,
    }
}

/// 標準フォントで表示できる文字に置き換える
///
/// 標準フォントはラテン文字しか持たないため、記号はASCIIに寄せ、それ以外は `?` にする。
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '×' => 'x',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{00A0}' => ' ',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn rgb(color: RgbColor) -> Color {
    Color::Rgb(Rgb {
        r: color[0] as f32 / 255.0,
        g: color[1] as f32 / 255.0,
        b: color[2] as f32 / 255.0,
        icc_profile: None,
    })
}

/// 1ページ分の描画命令
pub struct PageCanvas {
    width_mm: f64,
    height_mm: f64,
    ops: Vec<Op>,
}

impl PageCanvas {
    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
            ops: Vec::new(),
        }
    }

    /// 上からの距離(mm) → PDFのy座標(pt)
    fn pdf_y(&self, top_mm: f64) -> Pt {
        Pt(mm_to_pt(self.height_mm - top_mm) as f32)
    }

    fn point(&self, x_mm: f64, top_mm: f64) -> LinePoint {
        LinePoint {
            p: Point {
                x: Pt(mm_to_pt(x_mm) as f32),
                y: self.pdf_y(top_mm),
            },
            bezier: false,
        }
    }

    fn corners(&self, rect: Rect) -> Vec<LinePoint> {
        vec![
            self.point(rect.x, rect.y),
            self.point(rect.right(), rect.y),
            self.point(rect.right(), rect.bottom()),
            self.point(rect.x, rect.bottom()),
        ]
    }

    pub fn fill_rect(&mut self, rect: Rect, color: RgbColor) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        self.ops.push(Op::SetFillColor { col: rgb(color) });
        let points = self.corners(rect);
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: RgbColor, thickness_pt: f64) {
        self.set_stroke(color, thickness_pt);
        let points = self.corners(rect);
        self.ops.push(Op::DrawLine {
            line: Line {
                points,
                is_closed: true,
            },
        });
    }

    /// 水平線
    pub fn hline(&mut self, x1_mm: f64, x2_mm: f64, top_mm: f64, color: RgbColor, thickness_pt: f64) {
        self.set_stroke(color, thickness_pt);
        let points = vec![self.point(x1_mm, top_mm), self.point(x2_mm, top_mm)];
        self.ops.push(Op::DrawLine {
            line: Line {
                points,
                is_closed: false,
            },
        });
    }

    fn set_stroke(&mut self, color: RgbColor, thickness_pt: f64) {
        self.ops.push(Op::SetOutlineColor { col: rgb(color) });
        self.ops.push(Op::SetOutlineThickness {
            pt: Pt(thickness_pt as f32),
        });
    }

    /// 1行のテキスト。`baseline_mm` は上からのベースライン位置、`x_mm` は揃えの基準点
    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        text: &str,
        x_mm: f64,
        baseline_mm: f64,
        font: TextFont,
        size_pt: f64,
        color: RgbColor,
        align: Align,
    ) {
        let text = sanitize_text(text);
        if text.is_empty() {
            return;
        }
        let width = text_width_mm(&text, font, size_pt);
        let left = match align {
            Align::Left => x_mm,
            Align::Center => x_mm - width / 2.0,
            Align::Right => x_mm - width,
        };
        let font = builtin_font(font);
        let pos = self.point(left, baseline_mm).p;

        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor { pos });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size_pt as f32),
            font,
        });
        self.ops.push(Op::SetFillColor { col: rgb(color) });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text)],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    /// 画像を矩形いっぱいに描く（縦横比の調整は呼び出し側）
    pub fn image(&mut self, image: &EmbeddedImage, rect: Rect) {
        if image.width_px == 0 || image.height_px == 0 {
            return;
        }
        // dpi=72 では 1px = 1pt
        let scale_x = mm_to_pt(rect.width) / image.width_px as f64;
        let scale_y = mm_to_pt(rect.height) / image.height_px as f64;
        self.ops.push(Op::UseXobject {
            id: image.id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(mm_to_pt(rect.x) as f32)),
                translate_y: Some(self.pdf_y(rect.bottom())),
                dpi: Some(72.0),
                scale_x: Some(scale_x as f32),
                scale_y: Some(scale_y as f32),
                rotate: None,
            },
        });
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_page(self) -> PdfPage {
        PdfPage::new(Mm(self.width_mm as f32), Mm(self.height_mm as f32), self.ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("70×52.5×1 cm"), "70x52.5x1 cm");
        assert_eq!(sanitize_text("Grandma\u{2019}s \u{201C}best\u{201D}"), "Grandma's \"best\"");
        assert_eq!(sanitize_text("ผ้าทอ Karen"), "????? Karen");
        assert_eq!(sanitize_text("line\nbreak"), "line?break");
    }

    #[test]
    fn test_fill_rect_converts_origin() {
        let mut canvas = PageCanvas::new(210.0, 297.0);
        canvas.fill_rect(Rect::new(10.0, 0.0, 20.0, 10.0), [255, 0, 0]);
        assert_eq!(canvas.ops().len(), 2);

        match &canvas.ops()[1] {
            Op::DrawPolygon { polygon } => {
                let top_left = &polygon.rings[0].points[0].p;
                assert!((top_left.x.0 as f64 - mm_to_pt(10.0)).abs() < 0.01);
                assert!((top_left.y.0 as f64 - mm_to_pt(297.0)).abs() < 0.01);
                let bottom_left = &polygon.rings[0].points[3].p;
                assert!((bottom_left.y.0 as f64 - mm_to_pt(287.0)).abs() < 0.01);
            }
            other => panic!("DrawPolygonではない: {:?}", other),
        }
    }

    #[test]
    fn test_empty_rect_and_text_are_skipped() {
        let mut canvas = PageCanvas::new(210.0, 297.0);
        canvas.fill_rect(Rect::new(0.0, 0.0, 0.0, 10.0), [0, 0, 0]);
        canvas.text("", 10.0, 10.0, TextFont::Sans, 10.0, [0, 0, 0], Align::Left);
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn test_right_aligned_text_ends_at_anchor() {
        let mut canvas = PageCanvas::new(210.0, 297.0);
        canvas.text("PAGE 3", 195.0, 10.0, TextFont::Sans, 8.0, [0, 0, 0], Align::Right);
        let width = text_width_mm("PAGE 3", TextFont::Sans, 8.0);
        let cursor = canvas.ops().iter().find_map(|op| match op {
            Op::SetTextCursor { pos } => Some(pos.x.0 as f64),
            _ => None,
        });
        let expected = mm_to_pt(195.0 - width);
        assert!((cursor.unwrap() - expected).abs() < 0.01);
    }
}
