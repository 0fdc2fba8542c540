use crate::types::EnrichedRow;
use regex::Regex;
use std::sync::LazyLock;

static MARKDOWN_SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[*_`]").expect("static markdown pattern")
});

pub fn build_explanation_prompt(row: &EnrichedRow) -> String {
    let product = &row.observation;
    format!(
        "Explain in one sentence why this product — {} — is labeled as '{}'. \
         It is priced at {} with a rating of {}, and similar products cost about {}.",
        product.item_name,
        product.recommendation,
        format_price(product.unit_price),
        format_rating(product.rating),
        format_price(row.best_unit_price),
    )
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{:.2}", p),
        None => "unknown".to_string(),
    }
}

// Whole ratings keep one decimal ("4.0"), others print as-is.
fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r.is_finite() && r.fract() == 0.0 => format!("{:.1}", r),
        Some(r) => r.to_string(),
        None => "unknown".to_string(),
    }
}

/// Backslash-escapes `*`, `_` and `` ` ``. Applying it twice double-escapes.
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_SPECIAL.replace_all(text, r"\${0}").into_owned()
}

pub fn explanation_markdown(explanation: &str) -> String {
    format!("**RetailEye's Explanation:** {}", escape_markdown(explanation))
}
