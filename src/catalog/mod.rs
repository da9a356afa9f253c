//! 商品データの読み込みと選択
//!
//! 商品ストアからエクスポートしたJSON（配列、または `{"products": [...]}`）を読み込み、
//! スキーマ規則で検証してから絞り込み・並び替えを行う。

use crate::error::{CatalogueError, Result};
use catalogue_common::{
    ensure_valid, select_by_ids, sort_for_catalogue, validate_products, ProductFilter, ProductIssue,
    ProductRecord,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductFile {
    List(Vec<ProductRecord>),
    Wrapped { products: Vec<ProductRecord> },
}

/// JSONファイルを読み込む（検証なし）
pub fn read_products(path: &Path) -> Result<Vec<ProductRecord>> {
    if !path.is_file() {
        return Err(CatalogueError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let file: ProductFile = serde_json::from_str(&content)?;
    let products = match file {
        ProductFile::List(products) => products,
        ProductFile::Wrapped { products } => products,
    };
    Ok(products)
}

/// JSONファイルを読み込み、全商品を検証する
pub fn load_products(path: &Path) -> Result<Vec<ProductRecord>> {
    let products = read_products(path)?;

    ensure_valid(&products).map_err(|e| match e {
        catalogue_common::Error::Validation(message) => CatalogueError::Validation(message),
        other => other.into(),
    })?;

    log::debug!("{}件の商品を読み込み: {}", products.len(), path.display());
    Ok(products)
}

/// 検証結果のみ返す（validateコマンド用）
pub fn inspect_products(path: &Path) -> Result<(usize, Vec<ProductIssue>)> {
    let products = read_products(path)?;
    let issues = validate_products(&products);
    Ok((products.len(), issues))
}

/// カタログに載せる商品を選ぶ
///
/// IDが指定されていればID順、そのうえで絞り込み条件を適用し、
/// おすすめ商品優先・新しい順に並べる。
pub fn select_products(
    products: &[ProductRecord],
    filter: &ProductFilter,
    ids: &[String],
) -> Vec<ProductRecord> {
    let candidates = if ids.is_empty() {
        products.to_vec()
    } else {
        select_by_ids(products, ids)
    };

    let mut selected = filter.apply(&candidates);
    sort_for_catalogue(&mut selected);
    selected
}
