//! Read-only projection: active categories with their item counts.

use crate::catalog::model::CategoryStats;
use crate::core::error::CuratorError;
use crate::core::store::{CatalogStore, Predicate, Record, Table};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::warn;

/// Lenient view of a category row; tolerates rows the reconciler has not
/// converged yet.
#[derive(Deserialize)]
struct CategorySummary {
    category_key: String,
    name: String,
    #[serde(default)]
    order_index: i64,
    #[serde(default)]
    is_active: Option<bool>,
}

impl CategorySummary {
    fn from_record(record: &Record) -> Result<Self, CuratorError> {
        Ok(serde_json::from_value(JsonValue::Object(record.fields.clone()))?)
    }
}

pub fn try_get_stats<S: CatalogStore + ?Sized>(
    store: &S,
) -> Result<Vec<CategoryStats>, CuratorError> {
    let mut rows = Vec::new();
    for key in store.list_keys(Table::Categories)? {
        let Some(record) = store.get_by_key(Table::Categories, &key)? else {
            continue;
        };
        let summary = CategorySummary::from_record(&record)?;
        if summary.is_active == Some(false) {
            continue;
        }
        let item_count =
            store.count_where(Table::Items, &Predicate::eq("category_id", record.id.as_str()))?;
        rows.push((
            summary.order_index,
            CategoryStats {
                key: summary.category_key,
                name: summary.name,
                item_count,
            },
        ));
    }

    rows.sort_by(|(a_order, a), (b_order, b)| a_order.cmp(b_order).then_with(|| a.key.cmp(&b.key)));
    Ok(rows.into_iter().map(|(_, stats)| stats).collect())
}

/// Statistics are advisory: any failure yields an empty list.
pub fn get_stats<S: CatalogStore + ?Sized>(store: &S) -> Vec<CategoryStats> {
    try_get_stats(store).unwrap_or_else(|e| {
        warn!(error = %e, "catalog stats unavailable");
        Vec::new()
    })
}
