//! Aggregate statistics and the category listing.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::market::{KnownCategory, MarketInfo};

/// Counts over a full market list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStats {
    /// Number of markets.
    pub total: usize,
    /// Active markets.
    pub active_count: usize,
    /// Closed markets.
    pub closed_count: usize,
    /// Markets accepting orders.
    pub accepting_orders_count: usize,
    /// Markets per category.
    pub category_counts: BTreeMap<String, usize>,
}

/// One row of the category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category as stored on the markets.
    pub name: String,
    /// Number of markets.
    pub count: usize,
    /// Label for display.
    pub display_name: String,
}

/// Compute counts in a single pass, using each record's stored category.
pub fn stats(items: &[MarketInfo]) -> MarketStats {
    items.iter().fold(
        MarketStats {
            total: items.len(),
            ..Default::default()
        },
        |mut acc, m| {
            acc.active_count += usize::from(m.active);
            acc.closed_count += usize::from(m.closed);
            acc.accepting_orders_count += usize::from(m.accepting_orders);
            *acc.category_counts.entry(m.category.clone()).or_insert(0) += 1;
            acc
        },
    )
}

/// Categories by count descending; ties keep first-seen order.
pub fn categories(items: &[MarketInfo]) -> Vec<CategorySummary> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for m in items {
        match index.get(m.category.as_str()) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(m.category.as_str(), order.len());
                order.push((m.category.as_str(), 1));
            }
        }
    }

    // Stable sort keeps insertion order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));

    order
        .into_iter()
        .map(|(name, count)| CategorySummary {
            name: name.to_string(),
            count,
            display_name: display_name(name),
        })
        .collect()
}

/// Bilingual label for known categories, the name itself otherwise.
pub fn display_name(category: &str) -> String {
    KnownCategory::from_str(category)
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|_| category.to_string())
}
