use std::collections::HashMap;
use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{SortOrder, json_object, page_params, query_flag, record_id, sent};
use crate::catalog::CatalogData;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApiResponse, Category, CategoryWithCount, Pagination, ProductSummary, RecordStatus, paginate,
    string_enum,
};
use crate::state::AppState;
use crate::validation::{
    MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_PER_PAGE, Validator, parse_id, query_object,
};

const NOT_FOUND: &str = "Categoría no encontrada";

string_enum! {
    /// `sort_by` for the category listing.
    #[derive(Default)]
    pub enum CategorySort {
        #[default]
        Name => "name",
        CreatedAt => "created_at",
        ProductsCount => "products_count",
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryPage {
    categories: Vec<CategoryWithCount>,
    pagination: Pagination,
}

/// Validated category fields.
struct CategoryInput {
    name: String,
    description: Option<String>,
    status: Option<RecordStatus>,
}

impl CategoryInput {
    /// Validate a body; `current` is the id being updated, excluded from the
    /// unique-name check.
    fn validate(body: &Map<String, Value>, data: &CatalogData, current: Option<u64>) -> AppResult<Self> {
        let mut v = Validator::new(body)
            .message("name.required", "El nombre de la categoría es obligatorio")
            .message("name.unique", "Ya existe una categoría con este nombre")
            .message("name.max", "El nombre no puede exceder 255 caracteres")
            .message("description.max", "La descripción no puede exceder 1000 caracteres");

        let name = v.required_string("name", Some(MAX_NAME_LENGTH));
        if !v.has_error("name") && data.category_name_taken(&name, current) {
            v.fail("name", "unique", "El campo name ya ha sido registrado.".to_string());
        }
        let description = v.nullable_string("description", Some(MAX_DESCRIPTION_LENGTH));
        let status = v.optional_in("status", RecordStatus::VALUES);

        v.finish()?;

        Ok(Self {
            name,
            description,
            status,
        })
    }
}

fn with_count(data: &CatalogData, category: &Category) -> CategoryWithCount {
    CategoryWithCount {
        category: category.clone(),
        products_count: data.products_count(category.id),
        products: None,
    }
}

/// List categories with product counts.
///
/// Query: `per_page` (1-100, default 15), `page`, `status`, `search` (name or
/// description), `sort_by` (`name`, `created_at`, `products_count`),
/// `sort_order` (`asc`, `desc`).
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<CategoryPage>>> {
    let started = Instant::now();
    let query = query_object(&params);
    let mut v = Validator::new(&query);
    let max_per_page = i64::try_from(MAX_PER_PAGE).ok();
    let (page, per_page) = page_params(&mut v, 15, max_per_page);
    let status: Option<RecordStatus> = v.optional_in("status", RecordStatus::VALUES);
    let search = v.optional_string("search", Some(MAX_NAME_LENGTH));
    let sort_by: CategorySort = v.optional_in("sort_by", CategorySort::VALUES).unwrap_or_default();
    let sort_order: SortOrder = v.optional_in("sort_order", SortOrder::VALUES).unwrap_or_default();
    v.finish()?;

    let needle = search.map(|s| s.to_lowercase());

    let mut rows: Vec<CategoryWithCount> = {
        let data = state.catalog.read().await;
        data.categories
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .filter(|c| needle.as_deref().is_none_or(|n| c.matches(n)))
            .map(|c| with_count(&data, c))
            .collect()
    };

    rows.sort_by(|a, b| {
        let ordering = match sort_by {
            CategorySort::Name => a.category.name.cmp(&b.category.name),
            CategorySort::CreatedAt => a.category.created_at.cmp(&b.category.created_at),
            CategorySort::ProductsCount => a.products_count.cmp(&b.products_count),
        };
        sort_order.apply(ordering)
    });

    let (categories, pagination) = paginate(rows, page, per_page);

    Ok(Json(
        ApiResponse::data(CategoryPage {
            categories,
            pagination,
        })
        .with_message("Categorías obtenidas exitosamente")
        .timed(started),
    ))
}

/// Get a category; `include_products` adds its active products by name.
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<CategoryWithCount>>> {
    let id = parse_id(&id).ok_or_else(|| AppError::BadRequest("ID de categoría inválido".to_string()))?;

    let data = state.catalog.read().await;
    let category = data
        .categories
        .get(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    let mut body = with_count(&data, category);
    if query_flag(&params, "include_products") {
        let mut products: Vec<ProductSummary> = data
            .products
            .iter()
            .filter(|p| p.category_id == id && p.is_active())
            .map(ProductSummary::from)
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        body.products = Some(products);
    }

    Ok(Json(ApiResponse::data(body)))
}

/// Create a category with a unique name.
#[instrument(skip(state, body))]
pub async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<CategoryWithCount>>)> {
    let started = Instant::now();
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    let input = CategoryInput::validate(&body, &data, None)?;
    let now = Utc::now();

    let category = data
        .categories
        .insert_with(|id| Category {
            id,
            name: input.name,
            description: input.description,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
        .clone();
    drop(data);

    info!(category_id = category.id, name = %category.name, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(CategoryWithCount {
                category,
                products_count: 0,
                products: None,
            })
            .with_message("Categoría creada exitosamente")
            .timed(started),
        ),
    ))
}

/// Update a category; its own name does not count as taken.
#[instrument(skip(state, body))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<CategoryWithCount>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    if !data.categories.contains(id) {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    let input = CategoryInput::validate(&body, &data, Some(id))?;

    let Some(category) = data.categories.get_mut(id) else {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };
    category.name = input.name;
    if sent(&body, "description") {
        category.description = input.description;
    }
    if let Some(status) = input.status {
        category.status = status;
    }
    category.updated_at = Utc::now();
    let category = category.clone();
    let updated = with_count(&data, &category);

    info!(category_id = id, "Category updated");

    Ok(Json(
        ApiResponse::data(updated).with_message("Categoría actualizada exitosamente"),
    ))
}

/// Delete a category that has no products.
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = record_id(&id, NOT_FOUND)?;

    let mut data = state.catalog.write().await;
    if !data.categories.contains(id) {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    let products_count = data.products_count(id);
    if products_count > 0 {
        return Err(AppError::CategoryInUse { products_count });
    }

    data.categories.remove(id);
    info!(category_id = id, "Category deleted");

    Ok(Json(ApiResponse::message_only("Categoría eliminada exitosamente")))
}
