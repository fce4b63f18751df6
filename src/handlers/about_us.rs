use std::collections::HashMap;
use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{json_object, record_id, sent};
use crate::error::{AppError, AppResult};
use crate::models::{AboutUs, AboutUsSection, ApiResponse, RecordStatus};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LENGTH, Validator, query_object};

const NOT_FOUND: &str = "Sección no encontrada";

/// Validated about-us fields.
struct AboutUsInput {
    title: String,
    content: String,
    image_url: Option<String>,
    section: AboutUsSection,
    order: Option<i64>,
    status: Option<RecordStatus>,
}

impl AboutUsInput {
    fn validate(body: &Map<String, Value>) -> AppResult<Self> {
        let mut v = Validator::new(body);

        let title = v.required_string("title", Some(MAX_NAME_LENGTH));
        let content = v.required_string("content", None);
        let image_url = v.nullable_url("image_url");
        let section = v.required_in("section", AboutUsSection::VALUES);
        let order = v.optional_integer("order", Some(1), None);
        let status = v.optional_in("status", RecordStatus::VALUES);

        v.finish()?;

        Ok(Self {
            title,
            content,
            image_url,
            section,
            order,
            status,
        })
    }
}

/// Active sections by `order`, then creation time; optional `section` filter.
#[instrument(skip(state))]
pub async fn list_about_us(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Vec<AboutUs>>>> {
    let started = Instant::now();
    let query = query_object(&params);
    let mut v = Validator::new(&query);
    let section: Option<AboutUsSection> = v.optional_in("section", AboutUsSection::VALUES);
    v.finish()?;

    let mut sections: Vec<AboutUs> = state
        .catalog
        .read()
        .await
        .about_us
        .iter()
        .filter(|s| s.status == RecordStatus::Active)
        .filter(|s| section.is_none_or(|wanted| s.section == wanted))
        .cloned()
        .collect();
    sections.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));

    Ok(Json(
        ApiResponse::data(sections)
            .with_message("Información obtenida exitosamente")
            .timed(started),
    ))
}

#[instrument(skip(state))]
pub async fn get_about_us(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<AboutUs>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let section = state
        .catalog
        .read()
        .await
        .about_us
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::data(section)))
}

#[instrument(skip(state, body))]
pub async fn create_about_us(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<AboutUs>>)> {
    let started = Instant::now();
    let body = json_object(body)?;
    let input = AboutUsInput::validate(&body)?;
    let now = Utc::now();

    let section = state
        .catalog
        .write()
        .await
        .about_us
        .insert_with(|id| AboutUs {
            id,
            title: input.title,
            content: input.content,
            image_url: input.image_url,
            section: input.section,
            order: input.order.unwrap_or(1),
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
        .clone();

    info!(about_us_id = section.id, section = %section.section, "About-us section created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(section)
                .with_message("Sección creada exitosamente")
                .timed(started),
        ),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_about_us(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<AboutUs>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    let Some(section) = data.about_us.get_mut(id) else {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };
    let input = AboutUsInput::validate(&body)?;

    section.title = input.title;
    section.content = input.content;
    section.section = input.section;
    if sent(&body, "image_url") {
        section.image_url = input.image_url;
    }
    if let Some(order) = input.order {
        section.order = order;
    }
    if let Some(status) = input.status {
        section.status = status;
    }
    section.updated_at = Utc::now();

    info!(about_us_id = id, "About-us section updated");

    Ok(Json(
        ApiResponse::data(section.clone()).with_message("Sección actualizada exitosamente"),
    ))
}

#[instrument(skip(state))]
pub async fn delete_about_us(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = record_id(&id, NOT_FOUND)?;
    state
        .catalog
        .write()
        .await
        .about_us
        .remove(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    info!(about_us_id = id, "About-us section deleted");

    Ok(Json(ApiResponse::message_only("Sección eliminada exitosamente")))
}
