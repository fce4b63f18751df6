mod about_us;
mod categories;
mod faqs;
mod health;
mod products;
mod workshops;

use std::cmp::Ordering;
use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::models::string_enum;
use crate::validation::{Validator, parse_id};

pub use about_us::{create_about_us, delete_about_us, get_about_us, list_about_us, update_about_us};
pub use categories::{create_category, delete_category, get_category, list_categories, update_category};
pub use faqs::{create_faq, delete_faq, get_faq, list_faqs, update_faq};
pub use health::{health_check, stats};
pub use products::{
    create_product, delete_product, get_product, list_products, products_services, update_product,
};
pub use workshops::{create_workshop, delete_workshop, get_workshop, list_workshops, update_workshop};

string_enum! {
    /// `sort_order` query parameter.
    #[derive(Default)]
    pub enum SortOrder {
        #[default]
        Asc => "asc",
        Desc => "desc",
    }
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Calendar day used by date rules and workshop availability.
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Request body as a JSON object. Malformed JSON and non-object bodies are 400s.
fn json_object(body: Result<Json<Value>, JsonRejection>) -> AppResult<Map<String, Value>> {
    match body? {
        Json(Value::Object(map)) => Ok(map),
        Json(_) => Err(AppError::BadRequest(
            "El cuerpo de la solicitud debe ser un objeto JSON".to_string(),
        )),
    }
}

/// Route id of an existing record; anything unparseable is simply not found.
fn record_id(raw: &str, not_found: &str) -> AppResult<u64> {
    parse_id(raw).ok_or_else(|| AppError::NotFound(not_found.to_string()))
}

/// Truthy query flag (`1`, `true`, `on`, `yes`).
fn query_flag(params: &HashMap<String, String>, key: &str) -> bool {
    params
        .get(key)
        .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"))
}

/// `page` and `per_page` with the listing's default page size.
fn page_params(v: &mut Validator<'_>, default_per_page: u64, max_per_page: Option<i64>) -> (u64, u64) {
    let per_page = v
        .optional_integer("per_page", Some(1), max_per_page)
        .map_or(default_per_page, non_negative);
    let page = v.optional_integer("page", Some(1), None).map_or(1, non_negative);
    (page, per_page)
}

fn non_negative(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

/// Whether the optional `field` was sent, so updates only touch given keys.
fn sent(body: &Map<String, Value>, field: &str) -> bool {
    body.contains_key(field)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_object_rejects_arrays() {
        let err = json_object(Ok(Json(json!([1, 2])))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let map = json_object(Ok(Json(json!({ "name": "Lana" })))).unwrap();
        assert_eq!(map["name"], "Lana");
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id("7", "x").unwrap(), 7);
        assert!(matches!(record_id("abc", "x"), Err(AppError::NotFound(_))));
        assert!(record_id("0", "x").is_err());
    }

    #[test]
    fn test_query_flag() {
        let params: HashMap<String, String> = [("include_products".to_string(), "true".to_string())].into();
        assert!(query_flag(&params, "include_products"));
        assert!(!query_flag(&params, "featured"));
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortOrder::default().apply(Ordering::Less), Ordering::Less);
    }
}
