use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::error::{AppError, AppResult};
use crate::services::dispatch;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Jobs currently dispatched to the caller's fleet: everything assigned and
/// not yet finished.
pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let fleet_id = claims
        .effective_fleet()
        .ok_or_else(|| AppError::Forbidden("Fleet access required".to_string()))?;

    let jobs = booking::Entity::find()
        .filter(booking::Column::AssignedFleetId.eq(fleet_id))
        .filter(booking::Column::Status.is_in([
            BookingStatus::Assigned,
            BookingStatus::Accepted,
            BookingStatus::EnRoute,
            BookingStatus::Arrived,
            BookingStatus::InProgress,
        ]))
        .order_by_asc(booking::Column::PickupTime)
        .all(&state.db)
        .await?;

    Ok(Json(jobs))
}

/// Accept an assigned job. Safe to call twice: the second call is a no-op.
pub async fn accept_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let updated = dispatch::accept_job(&state, booking_id, &claims).await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
}

/// Attach a driver and vehicle to an accepted job, both at once
pub async fn assign_driver(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AssignDriverRequest>,
) -> AppResult<Json<booking::Model>> {
    let updated = dispatch::assign_driver_and_vehicle(
        &state,
        booking_id,
        payload.driver_id,
        payload.vehicle_id,
        &claims,
    )
    .await?;
    Ok(Json(updated))
}
