use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{Category, RecordStatus};

/// Product for sale.
///
/// Money and weight are fixed at two decimals and serialized as strings
/// (`"15990.00"`), the way decimal columns are rendered by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub stock: i64,
    pub category_id: u64,
    pub image_url: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub weight: Option<Decimal>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// Round half-up to two decimals and pin the scale so `15990` renders as `15990.00`.
pub fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Product with its category embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
}

/// Reduced product row embedded in a category (`include_products`).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductSummary {
    pub id: u64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub stock: i64,
    pub category_id: u64,
    pub status: RecordStatus,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            status: product.status,
        }
    }
}

/// Product row of the products-and-services overview.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub stock: i64,
    pub category_id: u64,
    pub image_url: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub category: Option<Category>,
}

impl ProductListing {
    pub fn new(product: &Product, category: Option<Category>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            image_url: product.image_url.clone(),
            material: product.material.clone(),
            color: product.color.clone(),
            category,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_money_rounds_midpoints_up() {
        for (input, expected) in [
            ("12.345", "12.35"),
            ("12.355", "12.36"),
            ("0.125", "0.13"),
            ("-2.345", "-2.35"),
            ("15990", "15990.00"),
        ] {
            let rounded = money(Decimal::from_str(input).unwrap());
            assert_eq!(rounded.to_string(), expected, "{input}");
        }
    }
}
