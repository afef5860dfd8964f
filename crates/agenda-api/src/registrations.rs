//! Registration endpoint handlers.
//!
//! Registrations are kept only in the database, so every handler answers
//! `503` when the API runs in memory-only mode. Request bodies are still
//! validated first, and a new registration must name an event the engine
//! knows about.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/registrations?event_id=` | Newest first, optionally for one event |
//! | `POST` | `/api/registrations` | Register an attendee |
//! | `GET` | `/api/registrations/search?q=` | Name or email contains `q` |
//! | `GET` | `/api/registrations/summary` | Attendance counts |
//! | `GET` | `/api/registrations/{id}` | Single registration |
//! | `PUT` | `/api/registrations/{id}` | Replace editable fields |
//! | `DELETE` | `/api/registrations/{id}` | Delete a registration |
//! | `POST` | `/api/registrations/{id}/checkin` | Mark the attendee as arrived |

use std::sync::Arc;

use agenda_db::RegistrationStore;
use agenda_types::{EventId, NewRegistration, RegistrationId, RegistrationUpdate};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /api/registrations`.
#[derive(Debug, serde::Deserialize)]
pub struct ListQuery {
    /// Only registrations for this event.
    pub event_id: Option<String>,
}

/// Query parameters for `GET /api/registrations/search`.
#[derive(Debug, serde::Deserialize)]
pub struct SearchQuery {
    /// Substring of the attendee name or email.
    pub q: Option<String>,
}

/// List registrations, newest first.
pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = query.event_id.as_deref().map(parse_event_id).transpose()?;
    let registrations = store(&state)?.list(event_id).await?;
    Ok(Json(registrations))
}

/// Register an attendee for a known event.
pub async fn create_registration(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewRegistration>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = payload?;
    validate_attendee(&new.name, &new.email)?;
    if state
        .scheduler
        .read()
        .await
        .get_event_by_id(&new.event_id)
        .is_none()
    {
        return Err(ApiError::NotFound(format!("event {}", new.event_id)));
    }

    let registration = store(&state)?.insert(new).await?;
    tracing::info!(
        id = %registration.id,
        event_id = %registration.event_id,
        "Registration created"
    );
    Ok((StatusCode::CREATED, Json(registration)))
}

/// Registrations whose name or email contains `q`.
pub async fn search_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.q.unwrap_or_default();
    let store = store(&state)?;
    let registrations = match term.trim() {
        "" => store.list(None).await?,
        term => store.search(term).await?,
    };
    Ok(Json(registrations))
}

/// Attendance counts.
pub async fn registration_summary(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(store(&state)?.summary().await?))
}

/// A single registration by id.
pub async fn get_registration(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let registration = store(&state)?
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("registration {id}")))?;
    Ok(Json(registration))
}

/// Replace a registration's editable fields.
pub async fn update_registration(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    payload: Result<Json<RegistrationUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let Json(update) = payload?;
    validate_attendee(&update.name, &update.email)?;

    let registration = store(&state)?
        .update(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("registration {id}")))?;
    tracing::info!(%id, status = %registration.status, "Registration updated");
    Ok(Json(registration))
}

/// Check an attendee in. A cancelled registration cannot be checked in.
pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let store = store(&state)?;

    if let Some(registration) = store.check_in(id).await? {
        tracing::info!(%id, "Attendee checked in");
        return Ok(Json(registration));
    }
    match store.get(id).await? {
        Some(_) => Err(ApiError::Conflict(format!(
            "registration {id} is cancelled"
        ))),
        None => Err(ApiError::NotFound(format!("registration {id}"))),
    }
}

/// Delete a registration.
pub async fn delete_registration(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    if !store(&state)?.delete(id).await? {
        return Err(ApiError::NotFound(format!("registration {id}")));
    }
    tracing::info!(%id, "Registration deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn store(state: &AppState) -> Result<&RegistrationStore, ApiError> {
    state.registrations.as_ref().ok_or_else(|| {
        ApiError::Unavailable("registrations require a database".to_owned())
    })
}

fn parse_id(s: &str) -> Result<RegistrationId, ApiError> {
    s.parse::<RegistrationId>()
        .map_err(|e| ApiError::InvalidRequest(format!("invalid registration id {s}: {e}")))
}

fn parse_event_id(s: &str) -> Result<EventId, ApiError> {
    s.parse::<EventId>()
        .map_err(|e| ApiError::InvalidRequest(format!("invalid event id {s}: {e}")))
}

fn validate_attendee(name: &str, email: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("name must not be empty".to_owned()));
    }
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        return Err(ApiError::InvalidRequest(format!("invalid email {email}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendee_needs_a_name_and_an_address() {
        assert!(validate_attendee("Ada", "ada@example.com").is_ok());
        assert!(validate_attendee("  ", "ada@example.com").is_err());
        assert!(validate_attendee("Ada", "ada.example.com").is_err());
        assert!(validate_attendee("Ada", "@example.com").is_err());
        assert!(validate_attendee("Ada", "ada@").is_err());
    }
}
