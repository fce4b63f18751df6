use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{json_object, record_id, sent, today};
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, DEFAULT_LOCATION, Difficulty, Workshop, WorkshopStatus, money};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LENGTH, Validator};

const NOT_FOUND: &str = "Taller no encontrado";

/// Shortest workshop, in minutes.
const MIN_DURATION: i64 = 30;

/// Validated workshop fields.
struct WorkshopInput {
    title: String,
    description: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    duration: i64,
    price: Decimal,
    max_participants: i64,
    location: Option<String>,
    instructor: Option<String>,
    image_url: Option<String>,
    difficulty_level: Option<Difficulty>,
    materials_included: Option<bool>,
    requirements: Option<String>,
    status: Option<WorkshopStatus>,
}

impl WorkshopInput {
    /// `not_before` is today on create; updates may keep past dates.
    fn validate(body: &Map<String, Value>, not_before: Option<NaiveDate>) -> AppResult<Self> {
        let mut v = Validator::new(body);

        let title = v.required_string("title", Some(MAX_NAME_LENGTH));
        let description = v.nullable_string("description", None);
        let date = v.required_date("date", not_before);
        let time = v.required_time("time");
        let duration = v.required_integer("duration", Some(MIN_DURATION), None);
        let price = v.required_decimal("price", Some(Decimal::ZERO));
        let max_participants = v.required_integer("max_participants", Some(1), None);
        let location = v.nullable_string("location", None);
        let instructor = v.nullable_string("instructor", Some(MAX_NAME_LENGTH));
        let image_url = v.nullable_url("image_url");
        let difficulty_level = v.optional_in("difficulty_level", Difficulty::VALUES);
        let materials_included = v.optional_boolean("materials_included");
        let requirements = v.nullable_string("requirements", None);
        let status = v.optional_in("status", WorkshopStatus::VALUES);

        v.finish()?;

        Ok(Self {
            title,
            description,
            date,
            time,
            duration,
            price: money(price),
            max_participants,
            location,
            instructor,
            image_url,
            difficulty_level,
            materials_included,
            requirements,
            status,
        })
    }
}

/// List every workshop by date.
#[instrument(skip(state))]
pub async fn list_workshops(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Workshop>>>> {
    let mut workshops: Vec<Workshop> = state.catalog.read().await.workshops.iter().cloned().collect();
    workshops.sort_by_key(|w| w.date);

    Ok(Json(ApiResponse::data(workshops)))
}

/// Get a workshop.
#[instrument(skip(state))]
pub async fn get_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Workshop>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let workshop = state
        .catalog
        .read()
        .await
        .workshops
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::data(workshop)))
}

/// Schedule a workshop on today or a later day. It starts with no
/// participants and at the default location unless one is given.
#[instrument(skip(state, body))]
pub async fn create_workshop(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Workshop>>)> {
    let body = json_object(body)?;
    let input = WorkshopInput::validate(&body, Some(today()))?;
    let now = Utc::now();

    let workshop = state
        .catalog
        .write()
        .await
        .workshops
        .insert_with(|id| Workshop {
            id,
            title: input.title,
            description: input.description,
            date: input.date,
            time: input.time,
            duration: input.duration,
            price: input.price,
            max_participants: input.max_participants,
            current_participants: 0,
            location: input.location.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            instructor: input.instructor,
            image_url: input.image_url,
            difficulty_level: input.difficulty_level.unwrap_or_default(),
            materials_included: input.materials_included.unwrap_or_default(),
            requirements: input.requirements,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
        .clone();

    info!(workshop_id = workshop.id, date = %workshop.date, "Workshop created");

    Ok((StatusCode::CREATED, Json(ApiResponse::data(workshop))))
}

/// Update a workshop. Participants are never changed here.
#[instrument(skip(state, body))]
pub async fn update_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Workshop>>> {
    let id = record_id(&id, NOT_FOUND)?;
    let body = json_object(body)?;

    let mut data = state.catalog.write().await;
    let Some(workshop) = data.workshops.get_mut(id) else {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };
    let input = WorkshopInput::validate(&body, None)?;

    workshop.title = input.title;
    workshop.date = input.date;
    workshop.time = input.time;
    workshop.duration = input.duration;
    workshop.price = input.price;
    workshop.max_participants = input.max_participants;
    if sent(&body, "description") {
        workshop.description = input.description;
    }
    if let Some(location) = input.location {
        workshop.location = location;
    }
    if sent(&body, "instructor") {
        workshop.instructor = input.instructor;
    }
    if sent(&body, "image_url") {
        workshop.image_url = input.image_url;
    }
    if sent(&body, "requirements") {
        workshop.requirements = input.requirements;
    }
    if let Some(level) = input.difficulty_level {
        workshop.difficulty_level = level;
    }
    if let Some(included) = input.materials_included {
        workshop.materials_included = included;
    }
    if let Some(status) = input.status {
        workshop.status = status;
    }
    workshop.updated_at = Utc::now();

    info!(workshop_id = id, "Workshop updated");

    Ok(Json(ApiResponse::data(workshop.clone())))
}

/// Delete a workshop.
#[instrument(skip(state))]
pub async fn delete_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = record_id(&id, NOT_FOUND)?;
    state
        .catalog
        .write()
        .await
        .workshops
        .remove(id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    info!(workshop_id = id, "Workshop deleted");

    Ok(Json(ApiResponse::message_only("Taller eliminado exitosamente")))
}
