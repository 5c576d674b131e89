//! Guestbook handlers: create, list, get.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateEntryRequest, EntryResponse};
use crate::app_state::AppState;
use crate::domain::EntryId;
use crate::error::{ErrorResponse, GuestbookError};

/// `POST /guestbook` — Record a new entry and notify subscribers.
///
/// # Errors
///
/// Returns [`GuestbookError::Validation`] for blank fields or a body that is
/// not a JSON object with string fields,
/// [`GuestbookError::Store`] when nothing was saved, and
/// [`GuestbookError::Publish`] when the entry was saved but subscribers were
/// not notified.
#[utoipa::path(
    post,
    path = "/api/v1/guestbook",
    tag = "Guestbook",
    summary = "Create a guestbook entry",
    description = "Validates, stores, and broadcasts a new entry. A 502 response means the entry was stored but the notification was not sent.",
    request_body = CreateEntryRequest,
    responses(
        (status = 201, description = "Entry created and broadcast", body = EntryResponse),
        (status = 400, description = "Name or message is blank, or the body is malformed", body = ErrorResponse),
        (status = 500, description = "Store failure, nothing saved", body = ErrorResponse),
        (status = 502, description = "Saved, but the notification failed", body = ErrorResponse),
    )
)]
pub async fn create_entry(
    State(state): State<AppState>,
    body: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GuestbookError> {
    let Json(req) = body.map_err(|rejection| GuestbookError::Validation(rejection.body_text()))?;
    let entry = state
        .guestbook_service
        .create_entry(req.name(), req.message())
        .await?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(&entry))))
}

/// `GET /guestbook` — List every entry.
///
/// # Errors
///
/// Returns [`GuestbookError::Store`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/guestbook",
    tag = "Guestbook",
    summary = "List guestbook entries",
    description = "Returns every stored entry.",
    responses(
        (status = 200, description = "All entries", body = Vec<EntryResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn list_entries(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GuestbookError> {
    let entries = state.guestbook_service.get_all_entries().await?;
    let data: Vec<EntryResponse> = entries.iter().map(EntryResponse::from).collect();
    Ok(Json(data))
}

/// `GET /guestbook/{id}` — Fetch one entry.
///
/// # Errors
///
/// Returns [`GuestbookError::EntryNotFound`] if no entry has this id.
#[utoipa::path(
    get,
    path = "/api/v1/guestbook/{id}",
    tag = "Guestbook",
    summary = "Get a guestbook entry",
    params(
        ("id" = String, Path, description = "Entry id"),
    ),
    responses(
        (status = 200, description = "Entry found", body = EntryResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse),
    )
)]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GuestbookError> {
    let id = EntryId::from_string(id);
    match state.guestbook_service.find_entry(&id).await? {
        Some(entry) => Ok(Json(EntryResponse::from(&entry))),
        None => Err(GuestbookError::EntryNotFound(id.into_string())),
    }
}

/// Guestbook routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guestbook", get(list_entries).post(create_entry))
        .route("/guestbook/{id}", get(get_entry))
}
