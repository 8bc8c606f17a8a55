//! Tracking sessions: time-bounded, token-keyed live location sharing for a
//! single booking.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::lifecycle::is_terminal;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::tracking_session::{self, TrackingStatus};
use crate::entities::{driver, location_ping};
use crate::error::{AppError, AppResult};
use crate::services::bookings::{find_booking, find_by_reference};
use crate::utils::geo::eta_minutes;
use crate::utils::token::tracking_token;
use crate::AppState;

/// A session is dead once its booking is terminal or the TTL has elapsed.
/// Pure function of stored timestamps and "now": no background sweep needed.
pub fn session_expired(
    session: &tracking_session::Model,
    booking_status: BookingStatus,
    now: DateTime<Utc>,
) -> bool {
    is_terminal(booking_status) || now >= session.expires_at.with_timezone(&Utc)
}

/// Create or return the tracking session for a booking. Idempotent: repeated
/// generate calls hand back the same token, never a duplicate link.
pub async fn generate(
    state: &AppState,
    booking_id: Uuid,
) -> AppResult<(tracking_session::Model, String)> {
    let booking = find_booking(&state.db, booking_id).await?;

    let Some(driver_id) = booking.assigned_driver_id else {
        return Err(AppError::NoDriverAssigned);
    };

    let driver_name = driver::Entity::find_by_id(driver_id)
        .one(&state.db)
        .await?
        .map(|d| d.name)
        .unwrap_or_default();

    if let Some(existing) = tracking_session::Entity::find()
        .filter(tracking_session::Column::BookingId.eq(booking_id))
        .one(&state.db)
        .await?
    {
        return Ok((existing, driver_name));
    }

    let now = Utc::now();
    let session = tracking_session::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        token: Set(tracking_token()),
        status: Set(TrackingStatus::Pending),
        created_at: Set(now.into()),
        expires_at: Set((now + Duration::hours(state.config.tracking_ttl_hours)).into()),
    };

    let created = session.insert(&state.db).await?;
    Ok((created, driver_name))
}

/// Record a driver location ping against an exact token. The first accepted
/// ping flips the session to `active`; expired sessions reject pings and the
/// rejected ping leaves no trace.
pub async fn record_ping(
    state: &AppState,
    token: &str,
    lat: f64,
    lng: f64,
) -> AppResult<location_ping::Model> {
    let session = tracking_session::Entity::find()
        .filter(tracking_session::Column::Token.eq(token))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tracking session not found".to_string()))?;

    let booking = find_booking(&state.db, session.booking_id).await?;

    if session_expired(&session, booking.status, Utc::now()) {
        // Persist the expiry lazily so viewers see it without a sweep job
        if session.status != TrackingStatus::Expired {
            let mut active: tracking_session::ActiveModel = session.into();
            active.status = Set(TrackingStatus::Expired);
            active.update(&state.db).await?;
        }
        return Err(AppError::SessionExpired);
    }

    if session.status == TrackingStatus::Pending {
        let mut active: tracking_session::ActiveModel = session.clone().into();
        active.status = Set(TrackingStatus::Active);
        active.update(&state.db).await?;
    }

    let ping = location_ping::ActiveModel {
        id: Set(Uuid::new_v4()),
        session_id: Set(session.id),
        lat: Set(lat),
        lng: Set(lng),
        recorded_at: Set(Utc::now().into()),
        ..Default::default()
    };
    Ok(ping.insert(&state.db).await?)
}

pub async fn latest_ping(
    db: &DatabaseConnection,
    session_id: Uuid,
) -> AppResult<Option<location_ping::Model>> {
    Ok(location_ping::Entity::find()
        .filter(location_ping::Column::SessionId.eq(session_id))
        .order_by_desc(location_ping::Column::RecordedAt)
        .one(db)
        .await?)
}

/// Best-effort ETA in minutes from the latest ping to the booking's dropoff.
/// `None` means "not yet available": no ping, or missing coordinates.
pub async fn compute_eta(state: &AppState, booking: &booking::Model) -> AppResult<Option<i64>> {
    let (Some(dest_lat), Some(dest_lng)) = (booking.dropoff_lat, booking.dropoff_lng) else {
        return Ok(None);
    };

    let Some(session) = tracking_session::Entity::find()
        .filter(tracking_session::Column::BookingId.eq(booking.id))
        .one(&state.db)
        .await?
    else {
        return Ok(None);
    };

    let Some(ping) = latest_ping(&state.db, session.id).await? else {
        return Ok(None);
    };

    Ok(Some(eta_minutes(ping.lat, ping.lng, dest_lat, dest_lng)))
}

/// Public read-only snapshot of a booking's live journey.
#[derive(Debug, serde::Serialize)]
pub struct TrackingSnapshot {
    pub reference: String,
    pub status: BookingStatus,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub driver_name: Option<String>,
    pub session_status: Option<TrackingStatus>,
    pub last_ping: Option<location_ping::Model>,
    pub eta_minutes: Option<i64>,
}

/// Exact-reference lookup for the unauthenticated customer tracking page.
/// Expired sessions report only their last known ping.
pub async fn snapshot_by_reference(
    state: &AppState,
    reference: &str,
) -> AppResult<TrackingSnapshot> {
    let booking = find_by_reference(&state.db, reference).await?;

    let driver_name = match booking.assigned_driver_id {
        Some(driver_id) => driver::Entity::find_by_id(driver_id)
            .one(&state.db)
            .await?
            .map(|d| d.name),
        None => None,
    };

    let session = tracking_session::Entity::find()
        .filter(tracking_session::Column::BookingId.eq(booking.id))
        .one(&state.db)
        .await?;

    let (session_status, last_ping, eta) = match &session {
        Some(s) => {
            let expired = session_expired(s, booking.status, Utc::now());
            let ping = latest_ping(&state.db, s.id).await?;
            let eta = if expired {
                None
            } else {
                compute_eta(state, &booking).await?
            };
            let status = if expired { TrackingStatus::Expired } else { s.status };
            (Some(status), ping, eta)
        }
        None => (None, None, None),
    };

    Ok(TrackingSnapshot {
        reference: booking.reference,
        status: booking.status,
        pickup_location: booking.pickup_location,
        dropoff_location: booking.dropoff_location,
        driver_name,
        session_status,
        last_ping,
        eta_minutes: eta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_expiry(expires_at: DateTime<Utc>) -> tracking_session::Model {
        tracking_session::Model {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            token: "x".repeat(32),
            status: TrackingStatus::Active,
            created_at: Utc::now().into(),
            expires_at: expires_at.into(),
        }
    }

    #[test]
    fn live_session_not_expired() {
        let session = session_with_expiry(Utc::now() + Duration::hours(1));
        assert!(!session_expired(&session, BookingStatus::EnRoute, Utc::now()));
    }

    #[test]
    fn ttl_elapse_expires() {
        let session = session_with_expiry(Utc::now() - Duration::minutes(1));
        assert!(session_expired(&session, BookingStatus::EnRoute, Utc::now()));
    }

    #[test]
    fn terminal_booking_expires_session_before_ttl() {
        let session = session_with_expiry(Utc::now() + Duration::hours(12));
        assert!(session_expired(&session, BookingStatus::Completed, Utc::now()));
        assert!(session_expired(&session, BookingStatus::Cancelled, Utc::now()));
        assert!(session_expired(&session, BookingStatus::DriverNoShow, Utc::now()));
    }
}
