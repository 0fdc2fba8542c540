use crate::data::Dataset;
use crate::types::{EnrichedRow, Kpis, ProductObservation, RecommendationCount};
use std::collections::{BTreeSet, HashMap, HashSet};

pub const ALL_RECOMMENDATIONS: &str = "All";

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub store: String,
    /// `None` means "All".
    pub recommendation: Option<String>,
}

impl Filter {
    pub fn new(store: impl Into<String>, recommendation: Option<&str>) -> Self {
        let recommendation = recommendation
            .map(str::trim)
            .filter(|r| !r.is_empty() && *r != ALL_RECOMMENDATIONS)
            .map(str::to_string);
        Self {
            store: store.into(),
            recommendation,
        }
    }

    pub fn recommendation_label(&self) -> &str {
        self.recommendation.as_deref().unwrap_or(ALL_RECOMMENDATIONS)
    }

    pub fn matches(&self, row: &ProductObservation) -> bool {
        row.store == self.store
            && self
                .recommendation
                .as_ref()
                .map_or(true, |r| &row.recommendation == r)
    }
}

pub fn store_options(rows: &[ProductObservation]) -> Vec<String> {
    rows.iter()
        .map(|r| r.store.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Picks the requested store when it exists, else the first in sorted order.
pub fn resolve_store(options: &[String], requested: Option<&str>) -> Option<String> {
    requested
        .and_then(|s| options.iter().find(|o| o.as_str() == s))
        .or_else(|| options.first())
        .cloned()
}

fn unique_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// "All" followed by the recommendations present for the store.
pub fn recommendation_options(rows: &[ProductObservation], store: &str) -> Vec<String> {
    let mut options = vec![ALL_RECOMMENDATIONS.to_string()];
    options.extend(unique_in_order(
        rows.iter()
            .filter(|r| r.store == store)
            .map(|r| r.recommendation.as_str()),
    ));
    options
}

pub fn apply_filter<'a>(rows: &'a [ProductObservation], filter: &Filter) -> Vec<&'a ProductObservation> {
    rows.iter().filter(|r| filter.matches(r)).collect()
}

pub fn kpis(rows: &[&ProductObservation]) -> Kpis {
    Kpis {
        total_products: rows.len(),
        overpriced: rows.iter().filter(|r| r.is_overpriced()).count(),
    }
}

/// Counts per recommendation, most frequent first; ties keep first appearance.
pub fn recommendation_counts(rows: &[&ProductObservation]) -> Vec<RecommendationCount> {
    let order = unique_in_order(rows.iter().map(|r| r.recommendation.as_str()));
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.recommendation.as_str()).or_default() += 1;
    }

    let mut chart: Vec<RecommendationCount> = order
        .into_iter()
        .map(|recommendation| {
            let count = counts.get(recommendation.as_str()).copied().unwrap_or(0);
            RecommendationCount {
                recommendation,
                count,
            }
        })
        .collect();
    // Stable sort preserves first-appearance order among equal counts.
    chart.sort_by(|a, b| b.count.cmp(&a.count));
    chart
}

pub fn enrich(dataset: &Dataset, rows: &[&ProductObservation]) -> Vec<EnrichedRow> {
    rows.iter()
        .map(|row| {
            let best = dataset.best_price(&row.item_name);
            EnrichedRow {
                observation: (*row).clone(),
                best_unit_price: best.map(|b| b.unit_price),
                best_store: best.map(|b| b.store.clone()),
            }
        })
        .collect()
}

pub fn product_choices(rows: &[EnrichedRow]) -> Vec<String> {
    unique_in_order(rows.iter().map(|r| r.observation.item_name.as_str()))
}

pub fn select_row<'a>(rows: &'a [EnrichedRow], item_name: &str) -> Option<&'a EnrichedRow> {
    rows.iter().find(|r| r.observation.item_name == item_name)
}

/// Everything one dashboard render needs, computed from a snapshot and the
/// current widget state.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub stores: Vec<String>,
    pub filter: Filter,
    pub recommendation_options: Vec<String>,
    pub kpis: Kpis,
    pub chart: Vec<RecommendationCount>,
    pub rows: Vec<EnrichedRow>,
    pub products: Vec<String>,
    pub selected_item: Option<String>,
}

impl DashboardView {
    pub fn build(
        dataset: &Dataset,
        store: Option<&str>,
        recommendation: Option<&str>,
        item: Option<&str>,
    ) -> Self {
        let stores = store_options(dataset.rows());
        let store = resolve_store(&stores, store).unwrap_or_default();
        let recommendation_options = recommendation_options(dataset.rows(), &store);

        // A recommendation absent for this store falls back to "All".
        let recommendation =
            recommendation.filter(|r| recommendation_options.iter().any(|o| o.as_str() == *r));
        let filter = Filter::new(store, recommendation);

        let filtered = apply_filter(dataset.rows(), &filter);
        let kpis = kpis(&filtered);
        let chart = recommendation_counts(&filtered);
        let rows = enrich(dataset, &filtered);
        let products = product_choices(&rows);
        let selected_item = item
            .and_then(|i| products.iter().find(|p| p.as_str() == i))
            .or_else(|| products.first())
            .cloned();

        Self {
            stores,
            filter,
            recommendation_options,
            kpis,
            chart,
            rows,
            products,
            selected_item,
        }
    }

    pub fn selected_row(&self) -> Option<&EnrichedRow> {
        self.selected_item
            .as_deref()
            .and_then(|item| select_row(&self.rows, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(item: &str, store: &str, price: f64, reco: &str, label: u8) -> ProductObservation {
        ProductObservation {
            item_name: item.to_string(),
            store: store.to_string(),
            unit_price: Some(price),
            rating: Some(4.0),
            recommendation: reco.to_string(),
            predicted_label: label,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            obs("Oat Milk", "Northside", 3.50, "Overpriced", 1),
            obs("Rice", "Northside", 9.99, "Fair", 0),
            obs("Oat Milk", "Eastgate", 2.75, "Fair", 0),
            obs("Tea", "Northside", 4.10, "Overpriced", 1),
            obs("Bread", "Northside", 1.20, "Underpriced", 0),
            obs("Rice", "Eastgate", 8.50, "Underpriced", 0),
            obs("Tea", "Northside", 3.90, "Fair", 0),
        ])
    }

    #[test]
    fn stores_are_sorted_and_unique() {
        assert_eq!(store_options(sample().rows()), vec!["Eastgate", "Northside"]);
    }

    #[test]
    fn unknown_store_falls_back_to_first() {
        let stores = store_options(sample().rows());
        assert_eq!(resolve_store(&stores, Some("Northside")).unwrap(), "Northside");
        assert_eq!(resolve_store(&stores, Some("Mars")).unwrap(), "Eastgate");
        assert_eq!(resolve_store(&stores, None).unwrap(), "Eastgate");
        assert_eq!(resolve_store(&[], None), None);
    }

    #[test]
    fn recommendation_options_start_with_all() {
        let options = recommendation_options(sample().rows(), "Northside");
        assert_eq!(options, vec!["All", "Overpriced", "Fair", "Underpriced"]);
    }

    #[test]
    fn filter_is_intersection_in_order() {
        let data = sample();
        let filter = Filter::new("Northside", Some("Overpriced"));
        let rows = apply_filter(data.rows(), &filter);
        let names: Vec<&str> = rows.iter().map(|r| r.item_name.as_str()).collect();
        assert_eq!(names, vec!["Oat Milk", "Tea"]);

        let all = apply_filter(data.rows(), &Filter::new("Northside", Some("All")));
        assert_eq!(all.len(), 5);
        assert_eq!(all[1].item_name, "Rice");
    }

    #[test]
    fn overpriced_kpi_counts_label_one() {
        let data = sample();
        let rows = apply_filter(data.rows(), &Filter::new("Northside", None));
        assert_eq!(
            kpis(&rows),
            Kpis {
                total_products: 5,
                overpriced: 2
            }
        );
    }

    #[test]
    fn chart_orders_by_count_then_first_appearance() {
        let data = sample();
        let rows = apply_filter(data.rows(), &Filter::new("Northside", None));
        let chart = recommendation_counts(&rows);
        let pairs: Vec<(&str, usize)> = chart
            .iter()
            .map(|c| (c.recommendation.as_str(), c.count))
            .collect();
        assert_eq!(
            pairs,
            vec![("Overpriced", 2), ("Fair", 2), ("Underpriced", 1)]
        );
    }

    #[test]
    fn best_price_join_uses_the_whole_table() {
        let data = sample();
        let rows = apply_filter(data.rows(), &Filter::new("Northside", None));
        let enriched = enrich(&data, &rows);
        let oat = select_row(&enriched, "Oat Milk").unwrap();
        assert_eq!(oat.best_unit_price, Some(2.75));
        assert_eq!(oat.best_store.as_deref(), Some("Eastgate"));
        let tea = select_row(&enriched, "Tea").unwrap();
        assert_eq!(tea.observation.unit_price, Some(4.10));
        assert_eq!(tea.best_unit_price, Some(3.90));
    }

    #[test]
    fn view_defaults_and_product_selection() {
        let data = sample();
        let view = DashboardView::build(&data, Some("Northside"), None, None);
        assert_eq!(view.filter.recommendation_label(), "All");
        assert_eq!(view.products, vec!["Oat Milk", "Rice", "Tea", "Bread"]);
        assert_eq!(view.selected_item.as_deref(), Some("Oat Milk"));

        let view = DashboardView::build(&data, Some("Northside"), Some("Fair"), Some("Tea"));
        let selected = view.selected_row().unwrap();
        assert_eq!(selected.observation.item_name, "Tea");
        assert_eq!(selected.observation.unit_price, Some(3.90));
    }

    #[test]
    fn recommendation_missing_for_store_resets_to_all() {
        let data = sample();
        let view = DashboardView::build(&data, Some("Eastgate"), Some("Overpriced"), None);
        assert_eq!(view.filter.recommendation, None);
        assert_eq!(view.kpis.total_products, 2);
    }
}
