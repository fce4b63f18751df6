use std::collections::HashMap;
use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{json_object, page_params, record_id, sent, today};
use crate::catalog::CatalogData;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApiResponse, CategoryRef, Pagination, Product, ProductListing, ProductWithCategory,
    RecordStatus, ServiceItem, money, paginate,
};
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LENGTH, MAX_PER_PAGE, MAX_SHORT_TEXT_LENGTH, Validator, query_object,
};

const NOT_FOUND: &str = "Producto no encontrado";

/// Upcoming workshops listed as services.
const MAX_SERVICES: usize = 10;

/// Products highlighted on the storefront.
const MAX_FEATURED: usize = 6;

/// Stock above which an active product may be featured.
const FEATURED_MIN_STOCK: i64 = 10;

#[derive(Debug, Serialize)]
pub struct ProductPage {
    products: Vec<ProductWithCategory>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProductsServices {
    products: Vec<ProductListing>,
    services: Vec<ServiceItem>,
    categories: Vec<CategoryRef>,
    featured: Vec<ProductListing>,
}

/// Validated product fields.
struct ProductInput {
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i64,
    category_id: u64,
    image_url: Option<String>,
    weight: Option<Decimal>,
    color: Option<String>,
    material: Option<String>,
    status: Option<RecordStatus>,
}

impl ProductInput {
    fn validate(body: &Map<String, Value>, data: &CatalogData) -> AppResult<Self> {
        let mut v = Validator::new(body);

        let name = v.required_string("name", Some(MAX_NAME_LENGTH));
        let description = v.nullable_string("description", None);
        let price = v.required_decimal("price", Some(Decimal::ZERO));
        let stock = v.required_integer("stock", Some(0), None);
        let category_id = u64::try_from(v.required_integer("category_id", None, None)).unwrap_or_default();
        if !v.has_error("category_id") && !data.categories.contains(category_id) {
            v.fail(
                "category_id",
                "exists",
                "El campo category_id seleccionado es inválido.".to_string(),
            );
        }
        let image_url = v.nullable_url("image_url");
        let weight = v.nullable_decimal("weight", Some(Decimal::ZERO));
        let color = v.nullable_string("color", Some(MAX_SHORT_TEXT_LENGTH));
        let material = v.nullable_string("material", Some(MAX_NAME_LENGTH));
        let status = v.optional_in("status", RecordStatus::VALUES);

        v.finish()?;

        Ok(Self {
            name,
            description,
            price: money(price),
            stock,
            category_id,
            image_url,
            weight,
            color,
            material,
            status,
        })
    }
}

fn with_category(data: &CatalogData, product: &Product) -> ProductWithCategory {
    ProductWithCategory {
        product: product.clone(),
        category: data.categories.get(product.category_id).cloned(),
    }
}

/// List products with their category, optionally filtered by `category_id`
/// and `status`.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<ProductPage>>> {
    let started = Instant::now();
    let query = query_object(&params);
    let mut v = Validator::new(&query);
    let (page, per_page) = page_params(&mut v, 15, None);
    v.finish()?;
    let per_page = per_page.min(MAX_PER_PAGE);

    let category_filter = params.get("category_id").map(|c| c.trim());
    let status_filter = params.get("status").map(String::as_str);

    let rows: Vec<ProductWithCategory> = {
        let data = state.catalog.read().await;
        data.products
            .iter()
            .filter(|p| category_filter.is_none_or(|c| p.category_id.to_string() == c))
            .filter(|p| status_filter.is_none_or(|s| p.status.as_str() == s))
            .map(|p| with_category(&data, p))
            .collect()
    };

    let (products, pagination) = paginate(rows, page, per_page);

    Ok(Json(
        ApiResponse::data(ProductPage {
            products,
            pagination,
        })
        .with_message("Productos obtenidos exitosamente")
        .timed(started),
    ))
}

/// Get a product with its category.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductWithCategory>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let data = state.catalog.read().await;
    let product = data
        .products
        .get(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::data(with_category(&data, product))))
}

/// Create a product. Status defaults to `active`.
#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductWithCategory>>)> {
    let started = Instant::now();
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    let input = ProductInput::validate(&body, &data)?;
    let now = Utc::now();

    let product = data
        .products
        .insert_with(|id| Product {
            id,
            name: input.name,
            description: input.description,
            price: input.price,
            stock: input.stock,
            category_id: input.category_id,
            image_url: input.image_url,
            weight: input.weight,
            color: input.color,
            material: input.material,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
        .clone();
    let created = with_category(&data, &product);
    drop(data);

    info!(product_id = product.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(created)
                .with_message("Producto creado exitosamente")
                .timed(started),
        ),
    ))
}

/// Update a product. Optional attributes are only changed when sent.
#[instrument(skip(state, body))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    if !data.products.contains(id) {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    let input = ProductInput::validate(&body, &data)?;

    let Some(product) = data.products.get_mut(id) else {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };
    product.name = input.name;
    product.price = input.price;
    product.stock = input.stock;
    product.category_id = input.category_id;
    if sent(&body, "description") {
        product.description = input.description;
    }
    if sent(&body, "image_url") {
        product.image_url = input.image_url;
    }
    if sent(&body, "weight") {
        product.weight = input.weight;
    }
    if sent(&body, "color") {
        product.color = input.color;
    }
    if sent(&body, "material") {
        product.material = input.material;
    }
    if let Some(status) = input.status {
        product.status = status;
    }
    product.updated_at = Utc::now();

    info!(product_id = id, "Product updated");

    Ok(Json(ApiResponse::data(product.clone())))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = record_id(&id, NOT_FOUND)?;
    state
        .catalog
        .write()
        .await
        .products
        .remove(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    info!(product_id = id, "Product deleted");

    Ok(Json(ApiResponse::message_only("Producto eliminado exitosamente")))
}

/// Storefront overview: active products, upcoming workshops as services,
/// active categories and featured products.
#[instrument(skip(state))]
pub async fn products_services(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductsServices>>> {
    let started = Instant::now();
    let today = today();
    let data = state.catalog.read().await;

    let mut active: Vec<&Product> = data.products.iter().filter(|p| p.is_active()).collect();
    active.sort_by(|a, b| a.name.cmp(&b.name));

    let products: Vec<ProductListing> = active
        .iter()
        .map(|p| ProductListing::new(p, data.categories.get(p.category_id).cloned()))
        .collect();

    let featured: Vec<ProductListing> = products
        .iter()
        .filter(|p| p.stock > FEATURED_MIN_STOCK)
        .take(MAX_FEATURED)
        .cloned()
        .collect();

    let mut upcoming: Vec<_> = data
        .workshops
        .iter()
        .filter(|w| w.is_upcoming(today) && w.is_available())
        .collect();
    upcoming.sort_by_key(|w| w.date);
    let services = upcoming
        .into_iter()
        .take(MAX_SERVICES)
        .map(|w| ServiceItem::new(w, today))
        .collect();

    let categories = data
        .categories
        .iter()
        .filter(|c| c.is_active())
        .map(CategoryRef::from)
        .collect();

    Ok(Json(
        ApiResponse::data(ProductsServices {
            products,
            services,
            categories,
            featured,
        })
        .with_message("Productos y servicios obtenidos exitosamente")
        .timed(started),
    ))
}
