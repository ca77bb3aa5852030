use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{CanonicalKey, CleanRecord, SourceBatch, StagedRecord};

/// Distinct product names offered by each source, taken from staged records
/// (after header normalization, before validation).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCatalog {
    per_source: Vec<(String, BTreeSet<String>)>,
}

impl ProductCatalog {
    pub fn from_staged(batches: &[SourceBatch<StagedRecord>]) -> Self {
        let per_source = batches
            .iter()
            .map(|batch| {
                let products = batch
                    .records
                    .iter()
                    .filter_map(|r| r.get(CanonicalKey::Product.as_str()))
                    .filter(|v| v.is_truthy())
                    .map(|v| v.to_string())
                    .collect();
                (batch.source.clone(), products)
            })
            .collect();

        Self { per_source }
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.per_source.iter().map(|(name, set)| (name.as_str(), set))
    }

    /// Every product seen in any source
    pub fn union(&self) -> BTreeSet<String> {
        self.per_source
            .iter()
            .flat_map(|(_, set)| set.iter().cloned())
            .collect()
    }

    /// Products present in every source; empty when there are no sources
    pub fn intersection(&self) -> BTreeSet<String> {
        let mut sets = self.per_source.iter().map(|(_, set)| set);
        let first = match sets.next() {
            Some(set) => set.clone(),
            None => return BTreeSet::new(),
        };
        sets.fold(first, |acc, set| acc.intersection(set).cloned().collect())
    }

    /// Products that appear in exactly one source
    pub fn unique_to_one_source(&self) -> BTreeSet<String> {
        let mut seen_in: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, set) in &self.per_source {
            for product in set {
                *seen_in.entry(product.as_str()).or_default() += 1;
            }
        }
        seen_in
            .into_iter()
            .filter(|(_, count)| *count == 1)
            .map(|(product, _)| product.to_string())
            .collect()
    }

    /// For each source, the products no other source offers
    pub fn exclusive_by_source(&self) -> Vec<(String, BTreeSet<String>)> {
        self.per_source
            .iter()
            .enumerate()
            .map(|(i, (name, set))| {
                let exclusive = set
                    .iter()
                    .filter(|p| {
                        self.per_source
                            .iter()
                            .enumerate()
                            .all(|(j, (_, other))| i == j || !other.contains(*p))
                    })
                    .cloned()
                    .collect();
                (name.clone(), exclusive)
            })
            .collect()
    }
}

/// Distinct customer names across the cleaned dataset
pub fn customer_set(dataset: &[CleanRecord]) -> BTreeSet<String> {
    dataset.iter().map(|r| r.customer_name.clone()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStats {
    pub product: String,
    pub total_quantity: u64,
    pub revenue: f64,
}

/// Quantity and revenue for every product in `products`, in the set's order.
/// Products with no accepted records are reported with zeros.
pub fn product_stats(products: &BTreeSet<String>, dataset: &[CleanRecord]) -> Vec<ProductStats> {
    let mut totals: BTreeMap<&str, (u64, f64)> = products.iter().map(|p| (p.as_str(), (0, 0.0))).collect();

    for record in dataset.iter().filter(|r| r.quantity > 0) {
        if let Some((quantity, revenue)) = totals.get_mut(record.product.as_str()) {
            *quantity += record.quantity;
            *revenue += record.revenue();
        }
    }

    products
        .iter()
        .map(|p| {
            let (total_quantity, revenue) = totals.get(p.as_str()).copied().unwrap_or((0, 0.0));
            ProductStats {
                product: p.clone(),
                total_quantity,
                revenue,
            }
        })
        .collect()
}

/// Highest revenue first; equal revenues keep their incoming order
pub fn rank_products(mut stats: Vec<ProductStats>) -> Vec<ProductStats> {
    stats.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerStats {
    pub customer: String,
    pub orders: usize,
    pub total_spent: f64,
}

/// Order count and spend per customer, biggest spender first (ties alphabetical)
pub fn customer_stats(dataset: &[CleanRecord]) -> Vec<CustomerStats> {
    let mut by_customer: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for record in dataset {
        let entry = by_customer.entry(record.customer_name.as_str()).or_default();
        entry.0 += 1;
        entry.1 += record.revenue();
    }

    let mut stats: Vec<CustomerStats> = by_customer
        .into_iter()
        .map(|(customer, (orders, total_spent))| CustomerStats {
            customer: customer.to_string(),
            orders,
            total_spent,
        })
        .collect();
    stats.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    stats
}

pub fn top_customers(dataset: &[CleanRecord], limit: usize) -> Vec<CustomerStats> {
    let mut stats = customer_stats(dataset);
    stats.truncate(limit);
    stats
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetTotals {
    pub records: usize,
    pub total_units: u64,
    pub total_revenue: f64,
}

pub fn dataset_totals(dataset: &[CleanRecord]) -> DatasetTotals {
    DatasetTotals {
        records: dataset.len(),
        total_units: dataset.iter().map(|r| r.quantity).sum(),
        total_revenue: dataset.iter().map(CleanRecord::revenue).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceProducts {
    pub source: String,
    pub products: BTreeSet<String>,
    pub exclusive: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub sources: Vec<SourceProducts>,
    pub all_products: BTreeSet<String>,
    pub common_products: BTreeSet<String>,
    pub unique_products: BTreeSet<String>,
}

/// Everything the report needs, computed in one read-only pass over the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesAnalytics {
    pub catalog: CatalogSummary,
    pub customers: BTreeSet<String>,
    pub product_ranking: Vec<ProductStats>,
    pub top_customers: Vec<CustomerStats>,
    pub totals: DatasetTotals,
}

impl SalesAnalytics {
    pub fn compute(
        staged: &[SourceBatch<StagedRecord>],
        dataset: &[CleanRecord],
        top_n: usize,
    ) -> Self {
        let catalog = ProductCatalog::from_staged(staged);
        let all_products = catalog.union();

        let sources = catalog
            .sources()
            .zip(catalog.exclusive_by_source())
            .map(|((source, products), (_, exclusive))| SourceProducts {
                source: source.to_string(),
                products: products.clone(),
                exclusive,
            })
            .collect();

        Self {
            product_ranking: rank_products(product_stats(&all_products, dataset)),
            catalog: CatalogSummary {
                sources,
                common_products: catalog.intersection(),
                unique_products: catalog.unique_to_one_source(),
                all_products,
            },
            customers: customer_set(dataset),
            top_customers: top_customers(dataset, top_n),
            totals: dataset_totals(dataset),
        }
    }
}
