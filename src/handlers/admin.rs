use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::UserRole;
use crate::entities::{booking_history, booking_note, fleet};
use crate::error::{AppError, AppResult};
use crate::services::bookings;
use crate::services::dispatch;
use crate::services::notify::{self, Notification};
use crate::services::tracking;
use crate::utils::jwt::{create_token, Claims};
use crate::AppState;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

// ============ Booking management ============

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub fleet_id: Option<Uuid>,
}

/// List bookings, optionally filtered by status and/or assigned fleet
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let mut find = booking::Entity::find().order_by_desc(booking::Column::CreatedAt);

    if let Some(status) = query.status {
        find = find.filter(booking::Column::Status.eq(status));
    }
    if let Some(fleet_id) = query.fleet_id {
        find = find.filter(booking::Column::AssignedFleetId.eq(fleet_id));
    }

    Ok(Json(find.all(&state.db).await?))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    Ok(Json(bookings::find_booking(&state.db, booking_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: BookingStatus,
}

/// Invoke a lifecycle transition on a booking
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<booking::Model>> {
    let updated =
        bookings::transition_status(&state, booking_id, query.status, &claims.actor_label())
            .await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AssignFleetRequest {
    pub fleet_id: Uuid,
}

/// Dispatch a booking to a fleet (or move it to a different fleet)
pub async fn assign_fleet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AssignFleetRequest>,
) -> AppResult<Json<booking::Model>> {
    let updated =
        dispatch::assign_to_fleet(&state, booking_id, payload.fleet_id, &claims.actor_label())
            .await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AdminNotesRequest {
    pub admin_notes: Option<String>,
}

/// Set or clear the free-form operator notes on a booking
pub async fn update_admin_notes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AdminNotesRequest>,
) -> AppResult<Json<booking::Model>> {
    let updated = bookings::set_admin_notes(
        &state,
        booking_id,
        payload.admin_notes,
        &claims.actor_label(),
    )
    .await?;
    Ok(Json(updated))
}

// ============ Notes & history ============

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub body: String,
}

pub async fn add_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AddNoteRequest>,
) -> AppResult<Json<booking_note::Model>> {
    if payload.body.trim().is_empty() {
        return Err(AppError::BadRequest("Note body is required".to_string()));
    }

    let note = bookings::add_note(&state, booking_id, &claims.actor_label(), payload.body).await?;
    Ok(Json(note))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Vec<booking_note::Model>>> {
    bookings::find_booking(&state.db, booking_id).await?;

    Ok(Json(
        booking_note::Entity::find()
            .filter(booking_note::Column::BookingId.eq(booking_id))
            .order_by_asc(booking_note::Column::CreatedAt)
            .all(&state.db)
            .await?,
    ))
}

pub async fn booking_history(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Vec<booking_history::Model>>> {
    bookings::find_booking(&state.db, booking_id).await?;
    Ok(Json(bookings::list_history(&state.db, booking_id).await?))
}

// ============ Tracking ============

#[derive(Debug, Serialize)]
pub struct TrackingLinkResponse {
    pub token: String,
    pub driver_name: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Generate (or return the existing) tracking link for a booking
pub async fn generate_tracking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<TrackingLinkResponse>> {
    let (session, driver_name) = tracking::generate(&state, booking_id).await?;

    Ok(Json(TrackingLinkResponse {
        token: session.token,
        driver_name,
        expires_at: session.expires_at.with_timezone(&chrono::Utc),
    }))
}

/// Email the tracking link to the customer via the notification relay
pub async fn send_tracking_email(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let booking = bookings::find_booking(&state.db, booking_id).await?;
    let (session, _) = tracking::generate(&state, booking_id).await?;

    notify::dispatch(
        &state.config,
        Notification::TrackingLink {
            booking_id,
            reference: booking.reference,
            customer_email: booking.customer_email,
            token: session.token,
        },
    );

    Ok(Json(serde_json::json!({ "message": "Tracking email queued" })))
}

// ============ Impersonation ============

#[derive(Debug, Serialize)]
pub struct ImpersonationResponse {
    pub token: String,
    pub acting_as_fleet: Uuid,
}

/// Issue a token that lets this admin act as the given fleet. The grant is a
/// claim on the token, so history entries keep naming the admin as actor.
pub async fn impersonate_fleet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(fleet_id): Path<Uuid>,
) -> AppResult<Json<ImpersonationResponse>> {
    if claims.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    fleet::Entity::find_by_id(fleet_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Fleet not found".to_string()))?;

    let token = create_token(
        claims.sub,
        &claims.email,
        claims.role.clone(),
        claims.fleet_id,
        Some(fleet_id),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(ImpersonationResponse {
        token,
        acting_as_fleet: fleet_id,
    }))
}

// ============ Fleet directory ============

pub async fn list_fleets(State(state): State<AppState>) -> AppResult<Json<Vec<fleet::Model>>> {
    Ok(Json(
        fleet::Entity::find()
            .order_by_asc(fleet::Column::Name)
            .all(&state.db)
            .await?,
    ))
}
