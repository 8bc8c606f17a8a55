//! Dispatch/assignment: attaching a fleet, then a driver + vehicle, to a
//! booking, and the fleet-side acceptance protocol.

use chrono::Utc;
use sea_orm::{EntityTrait, Set};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::driver::AvailabilityStatus;
use crate::entities::{driver, fleet, vehicle};
use crate::error::{AppError, AppResult};
use crate::services::bookings::{find_booking, record_history, update_guarded};
use crate::services::notify::{self, Notification};
use crate::utils::jwt::Claims;
use crate::AppState;

/// Assign (or re-assign) a booking to a fleet.
///
/// Initial assignment requires the booking to be `confirmed`. Re-assignment
/// is allowed while `assigned` or `accepted`, clears any driver/vehicle from
/// the previous fleet and drops the status back to `assigned`.
pub async fn assign_to_fleet(
    state: &AppState,
    booking_id: Uuid,
    fleet_id: Uuid,
    actor: &str,
) -> AppResult<booking::Model> {
    let current = find_booking(&state.db, booking_id).await?;

    let reassignment = match current.status {
        BookingStatus::Confirmed => false,
        BookingStatus::Assigned | BookingStatus::Accepted => true,
        other => return Err(AppError::BookingNotAssignable(other.as_str().to_string())),
    };

    let target_fleet = fleet::Entity::find_by_id(fleet_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Fleet not found".to_string()))?;

    if target_fleet.status != fleet::FleetStatus::Active {
        return Err(AppError::FleetInactive(target_fleet.name));
    }

    let mut changes = booking::ActiveModel {
        assigned_fleet_id: Set(Some(fleet_id)),
        status: Set(BookingStatus::Assigned),
        assigned_at: Set(Some(Utc::now().into())),
        ..Default::default()
    };
    if reassignment {
        // A driver from the old fleet must not persist on the record
        changes.assigned_driver_id = Set(None);
        changes.assigned_vehicle_id = Set(None);
    }

    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        booking_id,
        "fleet_assigned",
        actor,
        current.assigned_fleet_id.map(|id| id.to_string()),
        Some(fleet_id.to_string()),
    )
    .await;

    notify::dispatch(
        &state.config,
        Notification::FleetAssigned {
            booking_id,
            reference: current.reference.clone(),
            fleet_id,
        },
    );

    find_booking(&state.db, booking_id).await
}

/// What accepting a job in a given state does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Already accepted: succeed without touching the record
    NoOp,
    /// Move to accepted; `accepted_at` is stamped at most once, even if the
    /// job was re-assigned in between
    Accept { stamp_accepted_at: bool },
}

/// Acceptance guard, shared by every entry point: a repeat accept is a no-op
/// success so duplicate clicks and network retries are harmless; any state
/// other than `assigned`/`accepted` refuses.
pub fn accept_outcome(booking: &booking::Model) -> AppResult<AcceptOutcome> {
    match booking.status {
        BookingStatus::Accepted => Ok(AcceptOutcome::NoOp),
        BookingStatus::Assigned => Ok(AcceptOutcome::Accept {
            stamp_accepted_at: booking.accepted_at.is_none(),
        }),
        other => Err(AppError::BookingNotAssignable(other.as_str().to_string())),
    }
}

/// Fleet accepts an assigned job.
pub async fn accept_job(
    state: &AppState,
    booking_id: Uuid,
    claims: &Claims,
) -> AppResult<booking::Model> {
    let current = find_booking(&state.db, booking_id).await?;
    authorize_fleet_actor(&current, claims)?;

    let stamp_accepted_at = match accept_outcome(&current)? {
        AcceptOutcome::NoOp => return Ok(current),
        AcceptOutcome::Accept { stamp_accepted_at } => stamp_accepted_at,
    };

    let mut changes = booking::ActiveModel {
        status: Set(BookingStatus::Accepted),
        ..Default::default()
    };
    if stamp_accepted_at {
        changes.accepted_at = Set(Some(Utc::now().into()));
    }

    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        booking_id,
        "status_changed",
        &claims.actor_label(),
        Some(current.status.as_str().to_string()),
        Some(BookingStatus::Accepted.as_str().to_string()),
    )
    .await;

    notify::dispatch(
        &state.config,
        Notification::StatusChanged {
            booking_id,
            reference: current.reference.clone(),
            old_status: current.status.as_str().to_string(),
            new_status: BookingStatus::Accepted.as_str().to_string(),
        },
    );

    find_booking(&state.db, booking_id).await
}

/// Attach driver and vehicle to a booking, both-or-neither.
///
/// Legal at `assigned` or `accepted`. The driver must be active and belong to
/// the booking's fleet (or be fleet-less/internal); likewise the vehicle.
pub async fn assign_driver_and_vehicle(
    state: &AppState,
    booking_id: Uuid,
    driver_id: Uuid,
    vehicle_id: Uuid,
    claims: &Claims,
) -> AppResult<booking::Model> {
    let current = find_booking(&state.db, booking_id).await?;
    authorize_fleet_actor(&current, claims)?;

    if !matches!(
        current.status,
        BookingStatus::Assigned | BookingStatus::Accepted
    ) {
        return Err(AppError::BookingNotAssignable(
            current.status.as_str().to_string(),
        ));
    }

    let drv = driver::Entity::find_by_id(driver_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    if drv.status != AvailabilityStatus::Active {
        return Err(AppError::DriverUnavailable(drv.name));
    }
    // Fleet-owned drivers may only serve their own fleet's jobs; internal
    // (fleet-less) drivers may serve any
    if drv.fleet_id.is_some() && drv.fleet_id != current.assigned_fleet_id {
        return Err(AppError::DriverUnavailable(drv.name));
    }

    let veh = vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if veh.status != AvailabilityStatus::Active {
        return Err(AppError::VehicleUnavailable(veh.plate));
    }
    if veh.fleet_id.is_some() && veh.fleet_id != current.assigned_fleet_id {
        return Err(AppError::VehicleUnavailable(veh.plate));
    }

    // Single guarded write: a partial driver-without-vehicle assignment can
    // never come out of this operation
    let changes = booking::ActiveModel {
        assigned_driver_id: Set(Some(driver_id)),
        assigned_vehicle_id: Set(Some(vehicle_id)),
        ..Default::default()
    };
    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        booking_id,
        "driver_assigned",
        &claims.actor_label(),
        current.assigned_driver_id.map(|id| id.to_string()),
        Some(format!("driver:{} vehicle:{}", driver_id, vehicle_id)),
    )
    .await;

    find_booking(&state.db, booking_id).await
}

/// Fleet endpoints may only touch bookings assigned to the caller's fleet.
/// Admins without an acting-as grant pass unconditionally.
fn authorize_fleet_actor(current: &booking::Model, claims: &Claims) -> AppResult<()> {
    use crate::entities::user::UserRole;

    if claims.role == UserRole::Admin && claims.acting_as_fleet.is_none() {
        return Ok(());
    }

    match claims.effective_fleet() {
        Some(fleet_id) if current.assigned_fleet_id == Some(fleet_id) => Ok(()),
        _ => Err(AppError::Forbidden(
            "This job is not assigned to your fleet".to_string(),
        )),
    }
}
