//! レイアウト設定モジュール
//!
//! mm基準のページ寸法・グリッド・配色の定義（Source of Truth）。
//! 座標は左上原点（y軸は下向き）。PDF座標への変換は描画側で行う。

use crate::planner::LayoutType;

// ============================================
// mm基準レイアウト（Source of Truth）
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// 余白（mm）
pub const MARGIN_MM: f64 = 15.0;

/// ヘッダー帯: 文字のベースラインと下線の位置（mm、上から）
pub const HEADER_BASELINE_MM: f64 = 10.0;
pub const HEADER_RULE_MM: f64 = 12.0;

/// コンテンツ領域の開始位置（mm、上から）
pub const CONTENT_TOP_MM: f64 = 20.0;

/// カード間のギャップ（mm）
pub const GRID_GAP_MM: f64 = 5.0;

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// mm → pt 変換
#[inline]
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

/// pt → mm 変換
#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    pt / MM_TO_PT
}

// ============================================
// 矩形
// ============================================

/// 矩形（mm、左上原点）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// 四辺を均等に内側へ縮める（負の寸法にはしない）
    pub fn inset(&self, amount: f64) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: (self.width - amount * 2.0).max(0.0),
            height: (self.height - amount * 2.0).max(0.0),
        }
    }
}

/// 縦横比を保って枠内に収め、余白が均等になるよう中央に置く
///
/// `aspect_ratio > 枠の縦横比` なら幅いっぱい（上下に余白）、
/// それ以外は高さいっぱい（左右に余白）。
pub fn fit_inside(aspect_ratio: f64, frame: Rect) -> Rect {
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) || frame.width <= 0.0 || frame.height <= 0.0 {
        return frame;
    }
    let frame_ratio = frame.width / frame.height;
    if aspect_ratio > frame_ratio {
        let height = frame.width / aspect_ratio;
        Rect::new(frame.x, frame.y + (frame.height - height) / 2.0, frame.width, height)
    } else {
        let width = frame.height * aspect_ratio;
        Rect::new(frame.x + (frame.width - width) / 2.0, frame.y, width, frame.height)
    }
}

// ============================================
// 配色
// ============================================

/// RGB（0-255）
pub type RgbColor = [u8; 3];

/// カタログの配色（6色）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// 見出し（濃い茶）
    pub primary: RgbColor,
    /// アクセント文字（赤土色）
    pub secondary: RgbColor,
    /// 枠線（琥珀色）
    pub accent: RgbColor,
    /// 本文（濃いグレー）
    pub text: RgbColor,
    /// 補助テキスト（くすんだ茶）
    pub muted: RgbColor,
    /// ページ背景（オフホワイト）
    pub background: RgbColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: [74, 52, 40],
            secondary: [139, 90, 60],
            accent: [196, 165, 116],
            text: [60, 60, 60],
            muted: [140, 123, 107],
            background: [252, 250, 247],
        }
    }
}

/// カード背景
pub const CARD_FILL: RgbColor = [255, 255, 255];
/// 画像プレースホルダー背景
pub const PLACEHOLDER_FILL: RgbColor = [245, 242, 238];

// ============================================
// ページ寸法とグリッド
// ============================================

/// ページ寸法（mm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4縦
    pub fn a4() -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            margin_mm: MARGIN_MM,
        }
    }

    /// ページ全体
    pub fn page_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width_mm, self.height_mm)
    }

    /// ヘッダー帯より下、余白の内側
    pub fn content_rect(&self) -> Rect {
        Rect::new(
            self.margin_mm,
            CONTENT_TOP_MM,
            self.width_mm - self.margin_mm * 2.0,
            self.height_mm - CONTENT_TOP_MM - self.margin_mm,
        )
    }

    /// レイアウト種別ごとのスロット矩形（左上から行優先）
    pub fn slot_rects(&self, layout: LayoutType) -> Vec<Rect> {
        let area = self.content_rect();
        let (columns, rows) = layout.grid();
        let cell_width = (area.width - GRID_GAP_MM * (columns as f64 - 1.0)) / columns as f64;
        let cell_height = (area.height - GRID_GAP_MM * (rows as f64 - 1.0)) / rows as f64;

        (0..rows)
            .flat_map(|row| (0..columns).map(move |col| (row, col)))
            .map(|(row, col)| {
                Rect::new(
                    area.x + col as f64 * (cell_width + GRID_GAP_MM),
                    area.y + row as f64 * (cell_height + GRID_GAP_MM),
                    cell_width,
                    cell_height,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_conversion() {
        assert!((MM_TO_PT - 2.835).abs() < 0.01);
        assert!((mm_to_pt(10.0) - 28.35).abs() < 0.1);
        assert!(approx(pt_to_mm(mm_to_pt(42.0)), 42.0));
    }

    #[test]
    fn test_fit_inside_wide_image() {
        // 縦横比2.0を40×40へ → 40×20、上下10ずつ
        let fitted = fit_inside(2.0, Rect::new(0.0, 0.0, 40.0, 40.0));
        assert!(approx(fitted.width, 40.0));
        assert!(approx(fitted.height, 20.0));
        assert!(approx(fitted.y, 10.0));
        assert!(approx(40.0 - fitted.bottom(), 10.0));
        assert!(approx(fitted.x, 0.0));
    }

    #[test]
    fn test_fit_inside_tall_image() {
        let fitted = fit_inside(0.5, Rect::new(10.0, 20.0, 40.0, 40.0));
        assert!(approx(fitted.width, 20.0));
        assert!(approx(fitted.height, 40.0));
        assert!(approx(fitted.x, 20.0));
        assert!(approx(fitted.y, 20.0));
    }

    #[test]
    fn test_fit_inside_degenerate_ratio() {
        let frame = Rect::new(1.0, 2.0, 30.0, 10.0);
        assert_eq!(fit_inside(0.0, frame), frame);
        assert_eq!(fit_inside(f64::NAN, frame), frame);
    }

    #[test]
    fn test_content_rect() {
        let geometry = PageGeometry::a4();
        let area = geometry.content_rect();
        assert!(approx(area.x, 15.0));
        assert!(approx(area.width, 180.0));
        assert!(approx(area.bottom(), A4_HEIGHT_MM - MARGIN_MM));
    }

    #[test]
    fn test_slot_rects_counts_and_order() {
        let geometry = PageGeometry::a4();
        for layout in [LayoutType::Featured, LayoutType::TwoColumn, LayoutType::ThreeColumn] {
            let slots = geometry.slot_rects(layout);
            assert_eq!(slots.len(), layout.slots());
            // すべてコンテンツ領域内
            let area = geometry.content_rect();
            for slot in &slots {
                assert!(slot.x >= area.x - 1e-9 && slot.right() <= area.right() + 1e-9);
                assert!(slot.y >= area.y - 1e-9 && slot.bottom() <= area.bottom() + 1e-9);
            }
        }

        let slots = geometry.slot_rects(LayoutType::ThreeColumn);
        // 行優先: 0,1,2 が上段
        assert!(approx(slots[0].y, slots[2].y));
        assert!(slots[1].x > slots[0].x);
        assert!(slots[3].y > slots[0].y);
        assert!(approx(slots[1].x - slots[0].right(), GRID_GAP_MM));
    }

    #[test]
    fn test_rect_inset() {
        let rect = Rect::new(0.0, 0.0, 10.0, 4.0).inset(3.0);
        assert!(approx(rect.width, 4.0));
        assert!(approx(rect.height, 0.0));
    }
}
