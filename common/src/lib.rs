//! Craft Catalogue Common Library
//!
//! PDFカタログ生成で使う型と計算（I/Oなし）

pub mod types;
pub mod error;
pub mod validation;
pub mod filter;
pub mod weight;
pub mod planner;
pub mod layout;
pub mod text;
pub mod export;

pub use types::{Category, Currency, DimensionUnit, Dimensions, Price, ProductRecord, Tribe};
pub use error::{Error, Result};
pub use validation::{check_product, ensure_valid, validate_products, ProductIssue};
pub use filter::{select_by_ids, sort_for_catalogue, ProductFilter};
pub use weight::content_weight;
pub use planner::{plan_catalogue, plan_page, LayoutType, PageLayoutPlan, PlannerConfig};
pub use layout::{fit_inside, PageGeometry, Palette, Rect};
