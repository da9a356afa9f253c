//! 商品の絞り込みと並び順
//!
//! カタログ出力の呼び出し側で使う。パイプライン自体は受け取った順序のまま配置する。

use crate::error::{Error, Result};
use crate::types::{Category, ProductRecord, Tribe};
use std::cmp::Ordering;

/// 絞り込み条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub tribe: Option<Tribe>,
    pub category: Option<Category>,
    /// 商品名またはストーリーの部分一致（大文字小文字を区別しない）
    pub search: Option<String>,
    pub featured_only: bool,
}

impl ProductFilter {
    /// 文字列入力から構築する。`"all"` と空文字は条件なし
    pub fn from_parts(
        tribe: Option<&str>,
        category: Option<&str>,
        search: Option<&str>,
        featured_only: bool,
    ) -> Result<Self> {
        let tribe = match unconstrained(tribe) {
            None => None,
            Some(s) => Some(s.parse::<Tribe>().map_err(Error::Validation)?),
        };
        let category = match unconstrained(category) {
            None => None,
            Some(s) => Some(s.parse::<Category>().map_err(Error::Validation)?),
        };
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            tribe,
            category,
            search,
            featured_only,
        })
    }

    pub fn matches(&self, product: &ProductRecord) -> bool {
        if let Some(tribe) = self.tribe {
            if product.tribe != tribe {
                return false;
            }
        }
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }
        if self.featured_only && !product.featured {
            return false;
        }
        if let Some(needle) = &self.search {
            let hit = product.name.to_lowercase().contains(needle.as_str())
                || product.story.to_lowercase().contains(needle.as_str());
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, products: &[ProductRecord]) -> Vec<ProductRecord> {
        products.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

fn unconstrained(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
}

/// ID指定で選択（入力順を保つ）
pub fn select_by_ids(products: &[ProductRecord], ids: &[String]) -> Vec<ProductRecord> {
    products
        .iter()
        .filter(|p| ids.iter().any(|id| id == &p.id))
        .cloned()
        .collect()
}

/// カタログ用の並び順: おすすめ商品を先頭に、次に登録日時の新しい順（安定ソート）
pub fn sort_for_catalogue(products: &mut [ProductRecord]) {
    products.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| compare_created_desc(a, b))
    });
}

fn compare_created_desc(a: &ProductRecord, b: &ProductRecord) -> Ordering {
    // ISO 8601 (UTC) は文字列比較で時系列順になる。日時なしは末尾
    match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: &str, tribe: Tribe, category: Category, featured: bool, created: Option<&str>) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: format!("Item {}", id),
            tribe,
            category,
            story: "Handwoven hemp".to_string(),
            materials: vec!["Hemp".to_string()],
            dimensions: None,
            price: Price::default(),
            images: vec!["https://example.com/x.jpg".to_string()],
            stock_quantity: 1,
            featured,
            created_at: created.map(str::to_string),
        }
    }

    fn fixture() -> Vec<ProductRecord> {
        vec![
            product("a", Tribe::Karen, Category::Textiles, false, Some("2025-01-01T00:00:00Z")),
            product("b", Tribe::Hmong, Category::Bags, true, Some("2024-06-01T00:00:00Z")),
            product("c", Tribe::Karen, Category::Bags, false, Some("2025-05-01T00:00:00Z")),
            product("d", Tribe::Lisu, Category::Art, true, None),
        ]
    }

    #[test]
    fn test_from_parts_all_is_unconstrained() {
        let filter = ProductFilter::from_parts(Some("all"), Some("ALL"), Some("  "), false).unwrap();
        assert_eq!(filter, ProductFilter::default());
    }

    #[test]
    fn test_from_parts_rejects_unknown_tribe() {
        let err = ProductFilter::from_parts(Some("Thai"), None, None, false).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_filter_by_tribe_and_category() {
        let filter = ProductFilter::from_parts(Some("karen"), Some("bags"), None, false).unwrap();
        let selected = filter.apply(&fixture());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "c");
    }

    #[test]
    fn test_filter_featured_and_search() {
        let featured = ProductFilter::from_parts(None, None, None, true).unwrap();
        let ids: Vec<_> = featured.apply(&fixture()).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "d"]);

        let search = ProductFilter::from_parts(None, None, Some("HEMP"), false).unwrap();
        assert_eq!(search.apply(&fixture()).len(), 4);

        let search = ProductFilter::from_parts(None, None, Some("item c"), false).unwrap();
        assert_eq!(search.apply(&fixture())[0].id, "c");
    }

    #[test]
    fn test_select_by_ids_keeps_input_order() {
        let ids = vec!["d".to_string(), "a".to_string(), "zzz".to_string()];
        let selected: Vec<_> = select_by_ids(&fixture(), &ids).into_iter().map(|p| p.id).collect();
        assert_eq!(selected, vec!["a", "d"]);
    }

    #[test]
    fn test_sort_featured_first_then_newest() {
        let mut products = fixture();
        sort_for_catalogue(&mut products);
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "c", "a"]);
    }
}
