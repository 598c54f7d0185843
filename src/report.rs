use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::pipeline::processing::aggregate::AggregateResult;
use crate::pipeline::processing::classify::Category;

/// Output wrapper written to disk
#[derive(Debug, Serialize)]
pub struct CoverageReport<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub kind: &'static str,
    pub data: &'a T,
}

impl<'a, T: Serialize> CoverageReport<'a, T> {
    pub fn new(kind: &'static str, data: &'a T) -> Self {
        Self {
            generated_at: Utc::now(),
            kind,
            data,
        }
    }
}

/// One slice of the category distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub count: usize,
    /// Fraction of all counted nodes, 0.0 to 1.0
    pub share: f64,
}

/// Category distribution, largest first; ties keep category order
pub fn category_shares(result: &AggregateResult) -> Vec<CategoryShare> {
    let total: usize = result.category_counts.values().sum();
    let mut shares: Vec<CategoryShare> = result
        .category_counts
        .iter()
        .map(|(category, count)| CategoryShare {
            category: *category,
            count: *count,
            share: if total == 0 { 0.0 } else { *count as f64 / total as f64 },
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

/// Pretty-print `value` as JSON to `path`, creating parent directories
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result_with(counts: &[(Category, usize)]) -> AggregateResult {
        let mut result = AggregateResult::empty(1000.0);
        result.category_counts = counts.iter().copied().collect::<BTreeMap<_, _>>();
        result.total_found = counts.iter().map(|(_, c)| c).sum();
        result
    }

    #[test]
    fn test_shares_sorted_by_count() {
        let shares = category_shares(&result_with(&[
            (Category::Retail, 1),
            (Category::FoodAndDrink, 3),
            (Category::Other, 1),
        ]));
        assert_eq!(shares[0].category, Category::FoodAndDrink);
        assert!((shares[0].share - 0.6).abs() < 1e-9);
        // stable sort keeps enum order for ties
        assert_eq!(shares[1].category, Category::Retail);
        assert_eq!(shares[2].category, Category::Other);
    }

    #[test]
    fn test_write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nearby.json");
        let result = result_with(&[(Category::Financial, 2)]);
        write_json(&path, &CoverageReport::new("nearby", &result)).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["kind"], "nearby");
        assert_eq!(written["data"]["category_counts"]["Financial"], 2);
    }
}
