use std::collections::HashMap;
use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use super::{SortOrder, json_object, page_params, record_id};
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, Faq, FaqCategory, Pagination, RecordStatus, paginate, string_enum};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LENGTH, MAX_PER_PAGE, Validator, query_object};

const NOT_FOUND: &str = "FAQ no encontrada";

string_enum! {
    /// `sort_by` for the FAQ listing.
    #[derive(Default)]
    pub enum FaqSort {
        Question => "question",
        #[default]
        Order => "order",
        ViewsCount => "views_count",
        CreatedAt => "created_at",
    }
}

#[derive(Debug, Serialize)]
pub struct FaqPage {
    faqs: Vec<Faq>,
    categories: &'static [&'static str],
    pagination: Pagination,
}

/// Validated FAQ fields.
struct FaqInput {
    question: String,
    answer: String,
    category: Option<FaqCategory>,
    order: Option<i64>,
    featured: Option<bool>,
    status: Option<RecordStatus>,
}

impl FaqInput {
    fn validate(body: &Map<String, Value>) -> AppResult<Self> {
        let mut v = Validator::new(body)
            .message("question.required", "La pregunta es obligatoria")
            .message("question.max", "La pregunta no puede exceder 255 caracteres")
            .message("answer.required", "La respuesta es obligatoria")
            .message(
                "category.in",
                "La categoría debe ser: general, productos, talleres o envios",
            );

        let question = v.required_string("question", Some(MAX_NAME_LENGTH));
        let answer = v.required_string("answer", None);
        let category = v.optional_in("category", FaqCategory::VALUES);
        let order = v.optional_integer("order", Some(1), None);
        let featured = v.optional_boolean("featured");
        let status = v.optional_in("status", RecordStatus::VALUES);

        v.finish()?;

        Ok(Self {
            question,
            answer,
            category,
            order,
            featured,
            status,
        })
    }
}

/// List active FAQs.
///
/// Query: `category`, `featured`, `search` (question or answer), `per_page`
/// (1-100, default 20), `page`, `sort_by` (`question`, `order`,
/// `views_count`, `created_at`), `sort_order`.
#[instrument(skip(state))]
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<FaqPage>>> {
    let started = Instant::now();
    let query = query_object(&params);
    let mut v = Validator::new(&query);
    let category: Option<FaqCategory> = v.optional_in("category", FaqCategory::VALUES);
    let featured = v.optional_boolean("featured");
    let search = v.optional_string("search", Some(MAX_NAME_LENGTH));
    let max_per_page = i64::try_from(MAX_PER_PAGE).ok();
    let (page, per_page) = page_params(&mut v, 20, max_per_page);
    let sort_by: FaqSort = v.optional_in("sort_by", FaqSort::VALUES).unwrap_or_default();
    let sort_order: SortOrder = v.optional_in("sort_order", SortOrder::VALUES).unwrap_or_default();
    v.finish()?;

    let needle = search.map(|s| s.to_lowercase());

    let mut rows: Vec<Faq> = state
        .catalog
        .read()
        .await
        .faqs
        .iter()
        .filter(|f| f.is_active())
        .filter(|f| category.is_none_or(|c| f.category == c))
        .filter(|f| featured.is_none_or(|flag| f.featured == flag))
        .filter(|f| needle.as_deref().is_none_or(|n| f.matches(n)))
        .cloned()
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match sort_by {
            FaqSort::Question => a.question.cmp(&b.question),
            FaqSort::Order => a.order.cmp(&b.order),
            FaqSort::ViewsCount => a.views_count.cmp(&b.views_count),
            FaqSort::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        sort_order.apply(ordering)
    });

    let (faqs, pagination) = paginate(rows, page, per_page);

    Ok(Json(
        ApiResponse::data(FaqPage {
            faqs,
            categories: FaqCategory::VALUES,
            pagination,
        })
        .with_message("FAQs obtenidas exitosamente")
        .timed(started),
    ))
}

/// Get a FAQ and count the view.
#[instrument(skip(state))]
pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Faq>>> {
    let id = record_id(&id, NOT_FOUND)?;

    let mut data = state.catalog.write().await;
    let faq = data
        .faqs
        .get_mut(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    faq.views_count = faq.views_count.saturating_add(1);
    debug!(faq_id = id, views = faq.views_count, "FAQ viewed");

    Ok(Json(ApiResponse::data(faq.clone())))
}

/// Create a FAQ. Defaults: category `general`, order 1, not featured, active.
#[instrument(skip(state, body))]
pub async fn create_faq(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Faq>>)> {
    let started = Instant::now();
    let body = json_object(body)?;
    let input = FaqInput::validate(&body)?;
    let now = Utc::now();

    let faq = state
        .catalog
        .write()
        .await
        .faqs
        .insert_with(|id| Faq {
            id,
            question: input.question,
            answer: input.answer,
            category: input.category.unwrap_or_default(),
            order: input.order.unwrap_or(1),
            featured: input.featured.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            views_count: 0,
            created_at: now,
            updated_at: now,
        })
        .clone();

    info!(faq_id = faq.id, category = %faq.category, "FAQ created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(faq)
                .with_message("FAQ creada exitosamente")
                .timed(started),
        ),
    ))
}

/// Update a FAQ. The view counter is kept.
#[instrument(skip(state, body))]
pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Faq>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    let Some(faq) = data.faqs.get_mut(id) else {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };
    let input = FaqInput::validate(&body)?;

    faq.question = input.question;
    faq.answer = input.answer;
    if let Some(category) = input.category {
        faq.category = category;
    }
    if let Some(order) = input.order {
        faq.order = order;
    }
    if let Some(featured) = input.featured {
        faq.featured = featured;
    }
    if let Some(status) = input.status {
        faq.status = status;
    }
    faq.updated_at = Utc::now();

    info!(faq_id = id, "FAQ updated");

    Ok(Json(
        ApiResponse::data(faq.clone()).with_message("FAQ actualizada exitosamente"),
    ))
}

/// Delete a FAQ.
#[instrument(skip(state))]
pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = record_id(&id, NOT_FOUND)?;
    state
        .catalog
        .write()
        .await
        .faqs
        .remove(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    info!(faq_id = id, "FAQ deleted");

    Ok(Json(ApiResponse::message_only("FAQ eliminada exitosamente")))
}
