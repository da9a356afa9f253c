//! 商品レコードの型定義
//!
//! 商品ストアのJSON表現（camelCase）と同じ形でデシリアライズする。
//! パイプライン中は読み取り専用のスナップショットとして扱う。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================
// 列挙型（スキーマの固定値セット）
// ============================================

/// 民族（tribe）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tribe {
    Karen,
    Hmong,
    Lisu,
    Akha,
    Lahu,
    Yao,
    Other,
}

impl Tribe {
    pub const ALL: [Tribe; 7] = [
        Tribe::Karen,
        Tribe::Hmong,
        Tribe::Lisu,
        Tribe::Akha,
        Tribe::Lahu,
        Tribe::Yao,
        Tribe::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tribe::Karen => "Karen",
            Tribe::Hmong => "Hmong",
            Tribe::Lisu => "Lisu",
            Tribe::Akha => "Akha",
            Tribe::Lahu => "Lahu",
            Tribe::Yao => "Yao",
            Tribe::Other => "Other",
        }
    }
}

impl fmt::Display for Tribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tribe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tribe::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("{} is not a valid tribe", s))
    }
}

/// 商品カテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Textiles,
    Jewelry,
    Bags,
    #[serde(rename = "Home Decor")]
    HomeDecor,
    Clothing,
    Accessories,
    Art,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Textiles,
        Category::Jewelry,
        Category::Bags,
        Category::HomeDecor,
        Category::Clothing,
        Category::Accessories,
        Category::Art,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Textiles => "Textiles",
            Category::Jewelry => "Jewelry",
            Category::Bags => "Bags",
            Category::HomeDecor => "Home Decor",
            Category::Clothing => "Clothing",
            Category::Accessories => "Accessories",
            Category::Art => "Art",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "home-decor" / "homedecor" も受け付ける（CLI入力用）
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        Category::ALL
            .iter()
            .find(|c| {
                let name: String = c.as_str().chars().filter(|ch| !ch.is_whitespace()).collect();
                name.eq_ignore_ascii_case(&key)
            })
            .copied()
            .ok_or_else(|| format!("{} is not a valid category", s))
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Thb,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Thb => "THB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 寸法の単位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    #[default]
    Cm,
    Inch,
}

impl DimensionUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionUnit::Cm => "cm",
            DimensionUnit::Inch => "inch",
        }
    }
}

// ============================================
// 商品レコード
// ============================================

/// 寸法（各値は任意）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: DimensionUnit,
}

impl Dimensions {
    /// 長さ・幅・高さのいずれも未入力
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// 価格
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    #[serde(default)]
    pub currency: Currency,
}

/// 商品レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(alias = "_id", default)]
    pub id: String,

    pub name: String,

    pub tribe: Tribe,

    pub category: Category,

    #[serde(default)]
    pub story: String,

    #[serde(default)]
    pub materials: Vec<String>,

    #[serde(default)]
    pub dimensions: Option<Dimensions>,

    pub price: Price,

    /// 画像URL（先頭がメイン画像）
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub stock_quantity: u32,

    #[serde(default)]
    pub featured: bool,

    /// 登録日時（ISO 8601）。並び替えにのみ使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ProductRecord {
    /// メイン画像URL
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// サムネイル用の追加画像（最大 `max` 枚）
    pub fn extra_images(&self, max: usize) -> &[String] {
        let extra = self.images.get(1..).unwrap_or(&[]);
        &extra[..extra.len().min(max)]
    }

    /// 表示・ログ用の識別子（IDが空なら商品名）
    pub fn label(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}
