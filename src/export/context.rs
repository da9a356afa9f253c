use catalogue_common::{PageGeometry, Palette};
use chrono::{Datelike, NaiveDate};

pub const DEFAULT_TITLE: &str = "THAI TRIBAL CRAFTS";
pub const DEFAULT_SUBTITLE: &str = "Handcrafted Heritage Collection";
pub const SECTION_TITLE: &str = "PRODUCT COLLECTION";

/// 描画中は変更しない共通情報（ページ寸法・配色・ブランド文字列・生成日）
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub geometry: PageGeometry,
    pub palette: Palette,
    pub brand_name: String,
    pub title: String,
    pub subtitle: String,
    pub generated_on: NaiveDate,
}

impl RenderContext {
    pub fn new(brand_name: &str, title: &str, generated_on: NaiveDate) -> Self {
        Self {
            geometry: PageGeometry::a4(),
            palette: Palette::default(),
            brand_name: brand_name.to_string(),
            title: title.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            generated_on,
        }
    }

    /// 表紙の日付表記（例: "October 2026"）
    pub fn date_label(&self) -> String {
        self.generated_on.format("%B %Y").to_string()
    }

    /// ヘッダー左端のブランド表記
    pub fn brand_mark(&self) -> String {
        format!("{} | {}", self.brand_name.to_uppercase(), self.generated_on.year())
    }
}
