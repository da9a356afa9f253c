//! ページレイアウト計画
//!
//! 残りの商品のコンテンツ量から、次のページのレイアウト種別と配置数を決める。
//! 同じ入力に対して常に同じ計画を返す（乱数・I/Oなし）。

use crate::error::{Error, Result};
use crate::types::ProductRecord;
use crate::weight::mean_weight;
use serde::{Deserialize, Serialize};
use std::fmt;

/// レイアウト種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutType {
    /// 1商品を1ページ全面で
    Featured,
    /// 2列 × 2行
    TwoColumn,
    /// 3列 × 2行
    ThreeColumn,
}

impl LayoutType {
    /// グリッドのスロット数
    pub fn slots(&self) -> usize {
        match self {
            LayoutType::Featured => 1,
            LayoutType::TwoColumn => 4,
            LayoutType::ThreeColumn => 6,
        }
    }

    /// (列数, 行数)
    pub fn grid(&self) -> (usize, usize) {
        match self {
            LayoutType::Featured => (1, 1),
            LayoutType::TwoColumn => (2, 2),
            LayoutType::ThreeColumn => (3, 2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Featured => "featured",
            LayoutType::TwoColumn => "two-column",
            LayoutType::ThreeColumn => "three-column",
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 1ページ分の計画
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayoutPlan {
    pub layout_type: LayoutType,
    pub products_on_page: usize,
}

/// 計画パラメータ（経験的な定数。設定ファイルで変更可能）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    /// 平均算出に使う先読み件数
    pub sample_window: usize,
    /// これ以下なら軽量（3列）
    pub light_threshold: f64,
    /// これを超えると重量（2列）
    pub heavy_threshold: f64,
    pub two_column_capacity: usize,
    pub three_column_capacity: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            sample_window: 6,
            light_threshold: 400.0,
            heavy_threshold: 600.0,
            two_column_capacity: 4,
            three_column_capacity: 6,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_window == 0 {
            return Err(Error::Config("sampleWindow must be at least 1".into()));
        }
        if !(self.light_threshold.is_finite() && self.heavy_threshold.is_finite()) {
            return Err(Error::Config("thresholds must be finite numbers".into()));
        }
        if self.light_threshold > self.heavy_threshold {
            return Err(Error::Config(
                "lightThreshold must not exceed heavyThreshold".into(),
            ));
        }
        let capacities = [
            (LayoutType::TwoColumn, self.two_column_capacity),
            (LayoutType::ThreeColumn, self.three_column_capacity),
        ];
        for (layout, capacity) in capacities {
            if capacity == 0 || capacity > layout.slots() {
                return Err(Error::Config(format!(
                    "{} capacity must be between 1 and {}",
                    layout,
                    layout.slots()
                )));
            }
        }
        Ok(())
    }
}

/// `start` 以降の商品について次のページを計画する。残りがなければ `None`
pub fn plan_page(
    products: &[ProductRecord],
    start: usize,
    config: &PlannerConfig,
) -> Option<PageLayoutPlan> {
    let remaining = products.len().checked_sub(start).filter(|&n| n > 0)?;

    if remaining == 1 {
        return Some(PageLayoutPlan {
            layout_type: LayoutType::Featured,
            products_on_page: 1,
        });
    }

    let window_end = (start + config.sample_window.max(1)).min(products.len());
    let mean = mean_weight(&products[start..window_end]);

    let two_column = PageLayoutPlan {
        layout_type: LayoutType::TwoColumn,
        products_on_page: config.two_column_capacity.min(remaining),
    };
    let three_column = PageLayoutPlan {
        layout_type: LayoutType::ThreeColumn,
        products_on_page: config.three_column_capacity.min(remaining),
    };

    let plan = if mean > config.heavy_threshold {
        two_column
    } else if mean > config.light_threshold {
        if remaining >= config.three_column_capacity {
            three_column
        } else {
            two_column
        }
    } else {
        three_column
    };
    Some(plan)
}

/// 全ページの計画（プレビュー用）
pub fn plan_catalogue(products: &[ProductRecord], config: &PlannerConfig) -> Vec<PageLayoutPlan> {
    let mut plans = Vec::new();
    let mut cursor = 0;
    while let Some(plan) = plan_page(products, cursor, config) {
        cursor += plan.products_on_page.max(1);
        plans.push(plan);
    }
    plans
}
