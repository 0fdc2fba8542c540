//! The loaded recommendation snapshot and the per-item best price derived
//! from it.

use crate::types::{BestPrice, ProductObservation};
use crate::{AppError, Result};
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "itemname",
    "Store",
    "UnitPrice",
    "Rating",
    "recommendation",
    "predicted_label",
];

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<ProductObservation>,
    best_prices: HashMap<String, BestPrice>,
}

impl Dataset {
    pub fn new(rows: Vec<ProductObservation>) -> Self {
        let best_prices = derive_best_prices(&rows);
        Self { rows, best_prices }
    }

    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(parse_csv(bytes)?))
    }

    pub fn rows(&self) -> &[ProductObservation] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn best_price(&self, item_name: &str) -> Option<&BestPrice> {
        self.best_prices.get(item_name)
    }

    pub fn item_count(&self) -> usize {
        self.best_prices.len()
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ProductObservation>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Parse(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Minimum unit price per item name over the whole table. Rows without a
/// price never win; on ties the earliest row is kept.
pub fn derive_best_prices(rows: &[ProductObservation]) -> HashMap<String, BestPrice> {
    let mut best: HashMap<String, BestPrice> = HashMap::new();
    for row in rows {
        let Some(price) = row.unit_price.filter(|p| !p.is_nan()) else {
            continue;
        };
        match best.get_mut(&row.item_name) {
            Some(current) if price < current.unit_price => {
                current.unit_price = price;
                current.store = row.store.clone();
            }
            Some(_) => {}
            None => {
                best.insert(
                    row.item_name.clone(),
                    BestPrice {
                        unit_price: price,
                        store: row.store.clone(),
                    },
                );
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
itemname,Store,UnitPrice,Rating,recommendation,predicted_label
Oat Milk,Northside,3.50,4.5,Overpriced,1
Oat Milk,Eastgate,2.75,4.1,Fair,0
Rice 5kg,Northside,9.99,3.9,Underpriced,0
Oat Milk,Westfield,2.75,4.0,Fair,0
Rice 5kg,Eastgate,11.20,4.2,Overpriced,1
";

    #[test]
    fn parses_rows_by_header() {
        let rows = parse_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].item_name, "Oat Milk");
        assert_eq!(rows[0].store, "Northside");
        assert_eq!(rows[0].unit_price, Some(3.5));
        assert_eq!(rows[0].rating, Some(4.5));
        assert!(rows[0].is_overpriced());
        assert!(!rows[1].is_overpriced());
    }

    #[test]
    fn column_order_and_extra_columns_are_ignored() {
        let csv = "\
predicted_label,extra,recommendation,Rating,UnitPrice,Store,itemname
1.0,x,Overpriced,,4.00,Northside,Tea
";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].item_name, "Tea");
        assert_eq!(rows[0].rating, None);
        assert_eq!(rows[0].predicted_label, 1);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = parse_csv(b"itemname,Store\nTea,Northside\n").unwrap_err();
        match err {
            AppError::Parse(msg) => {
                assert!(msg.contains("UnitPrice"));
                assert!(msg.contains("predicted_label"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn malformed_label_is_a_parse_error() {
        let csv = "itemname,Store,UnitPrice,Rating,recommendation,predicted_label\nTea,N,1,4,Fair,maybe\n";
        assert!(matches!(parse_csv(csv.as_bytes()), Err(AppError::Parse(_))));
    }

    #[test]
    fn best_price_is_global_minimum_with_first_occurrence_ties() {
        let dataset = Dataset::from_csv(SAMPLE.as_bytes()).unwrap();
        let oat = dataset.best_price("Oat Milk").unwrap();
        assert_eq!(oat.unit_price, 2.75);
        assert_eq!(oat.store, "Eastgate");
        let rice = dataset.best_price("Rice 5kg").unwrap();
        assert_eq!(rice.unit_price, 9.99);
        assert_eq!(rice.store, "Northside");
        assert_eq!(dataset.item_count(), 2);
    }

    #[test]
    fn unpriced_rows_never_win() {
        let csv = "\
itemname,Store,UnitPrice,Rating,recommendation,predicted_label
Tea,Northside,,4,Fair,0
Tea,Eastgate,5.00,4,Fair,0
Coffee,Northside,,4,Fair,0
";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.best_price("Tea").unwrap().store, "Eastgate");
        assert!(dataset.best_price("Coffee").is_none());
    }

    #[test]
    fn header_only_file_is_empty() {
        let dataset = Dataset::from_csv(REQUIRED_COLUMNS.join(",").as_bytes()).unwrap();
        assert!(dataset.is_empty());
    }
}
