//! Booking store: creation, payment confirmation, status transitions,
//! ratings, notes and the audit trail.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::lifecycle::{self, Milestone};
use crate::domain::quote::{quote_price, QuoteRequest};
use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::entities::{booking_history, booking_note, driver};
use crate::error::{AppError, AppResult};
use crate::services::notify::{self, Notification};
use crate::utils::token::booking_reference;
use crate::AppState;

pub async fn find_booking(db: &DatabaseConnection, id: Uuid) -> AppResult<booking::Model> {
    crate::db::with_backoff(|| booking::Entity::find_by_id(id).one(db))
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Exact-match lookup by reference code; the public surface never searches
/// by prefix or fuzzy match.
pub async fn find_by_reference(
    db: &DatabaseConnection,
    reference: &str,
) -> AppResult<booking::Model> {
    crate::db::with_backoff(|| {
        booking::Entity::find()
            .filter(booking::Column::Reference.eq(reference))
            .one(db)
    })
    .await?
    .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Interpret the row count of a version-filtered update: zero rows means a
/// concurrent writer bumped the version first, and this write lost.
pub fn check_version_guard(rows_affected: u64) -> AppResult<()> {
    if rows_affected == 0 {
        return Err(AppError::ConcurrentModification);
    }
    Ok(())
}

/// Apply a mutation through the optimistic version check. Concurrent writers
/// against the same booking serialize here: the loser matches zero rows and
/// gets `ConcurrentModification`.
pub async fn update_guarded(
    db: &DatabaseConnection,
    current: &booking::Model,
    mut changes: booking::ActiveModel,
) -> AppResult<()> {
    changes.version = Set(current.version + 1);

    let result = booking::Entity::update_many()
        .set(changes)
        .filter(booking::Column::Id.eq(current.id))
        .filter(booking::Column::Version.eq(current.version))
        .exec(db)
        .await?;

    check_version_guard(result.rows_affected)
}

/// Append an audit entry. Failures are logged, never propagated: the audit
/// trail must not roll back the state change it describes.
pub async fn record_history(
    db: &DatabaseConnection,
    booking_id: Uuid,
    action: &str,
    actor: &str,
    old_value: Option<String>,
    new_value: Option<String>,
) {
    let entry = booking_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        action: Set(action.to_string()),
        actor: Set(actor.to_string()),
        old_value: Set(old_value),
        new_value: Set(new_value),
        ..Default::default()
    };

    if let Err(err) = entry.insert(db).await {
        tracing::error!(
            %booking_id,
            action,
            error = %err,
            "failed to append booking history"
        );
    }
}

pub async fn list_history(
    db: &DatabaseConnection,
    booking_id: Uuid,
) -> AppResult<Vec<booking_history::Model>> {
    Ok(booking_history::Entity::find()
        .filter(booking_history::Column::BookingId.eq(booking_id))
        .order_by_asc(booking_history::Column::CreatedAt)
        .all(db)
        .await?)
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub pickup_location: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_location: String,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub pickup_time: chrono::DateTime<Utc>,
    pub passengers: i32,
    pub luggage: i32,
    pub vehicle_category: String,
    pub flight_number: Option<String>,
    pub child_seats: i32,
}

/// Create a booking in `pending`. Prices come from the quoter, never from
/// the caller.
pub async fn create_booking(state: &AppState, new: NewBooking) -> AppResult<booking::Model> {
    if new.passengers <= 0 {
        return Err(AppError::BadRequest(
            "At least one passenger is required".to_string(),
        ));
    }
    if new.pickup_time < Utc::now() {
        return Err(AppError::BadRequest(
            "Pickup time must be in the future".to_string(),
        ));
    }

    let quote = quote_price(&QuoteRequest {
        vehicle_category: new.vehicle_category.clone(),
        pickup_lat: new.pickup_lat,
        pickup_lng: new.pickup_lng,
        dropoff_lat: new.dropoff_lat,
        dropoff_lng: new.dropoff_lng,
        passengers: new.passengers,
        child_seats: new.child_seats,
    });

    let model = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        reference: Set(booking_reference()),
        customer_name: Set(new.customer_name),
        customer_email: Set(new.customer_email),
        customer_phone: Set(new.customer_phone),
        pickup_location: Set(new.pickup_location),
        pickup_lat: Set(new.pickup_lat),
        pickup_lng: Set(new.pickup_lng),
        dropoff_location: Set(new.dropoff_location),
        dropoff_lat: Set(new.dropoff_lat),
        dropoff_lng: Set(new.dropoff_lng),
        pickup_time: Set(new.pickup_time.into()),
        passengers: Set(new.passengers),
        luggage: Set(new.luggage),
        vehicle_category: Set(new.vehicle_category),
        flight_number: Set(new.flight_number),
        child_seats: Set(new.child_seats),
        customer_price: Set(quote.customer_price),
        driver_price: Set(quote.driver_price),
        status: Set(BookingStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        assigned_fleet_id: Set(None),
        assigned_driver_id: Set(None),
        assigned_vehicle_id: Set(None),
        version: Set(0),
        ..Default::default()
    };

    let created = model.insert(&state.db).await?;
    record_history(
        &state.db,
        created.id,
        "booking_created",
        "system",
        None,
        Some(created.status.as_str().to_string()),
    )
    .await;

    Ok(created)
}

/// Move a booking along the lifecycle graph.
///
/// Side effects are strictly sequenced: persist status, append history, emit
/// event. Neither history nor notification failures roll back the change.
pub async fn transition_status(
    state: &AppState,
    booking_id: Uuid,
    target: BookingStatus,
    actor: &str,
) -> AppResult<booking::Model> {
    let current = find_booking(&state.db, booking_id).await?;
    lifecycle::check_transition(&current, target)?;

    let now = Utc::now();
    let mut changes = booking::ActiveModel {
        status: Set(target),
        ..Default::default()
    };
    match lifecycle::milestone_for(target) {
        Some(Milestone::Assigned) => changes.assigned_at = Set(Some(now.into())),
        // accepted_at is stamped at most once, even across re-assignment
        Some(Milestone::Accepted) if current.accepted_at.is_none() => {
            changes.accepted_at = Set(Some(now.into()))
        }
        Some(Milestone::Completed) => changes.completed_at = Set(Some(now.into())),
        _ => {}
    }

    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        booking_id,
        "status_changed",
        actor,
        Some(current.status.as_str().to_string()),
        Some(target.as_str().to_string()),
    )
    .await;

    notify::dispatch(
        &state.config,
        Notification::StatusChanged {
            booking_id,
            reference: current.reference.clone(),
            old_status: current.status.as_str().to_string(),
            new_status: target.as_str().to_string(),
        },
    );

    find_booking(&state.db, booking_id).await
}

/// Payment confirmation webhook: mark paid and advance `pending -> confirmed`.
pub async fn confirm_payment(state: &AppState, booking_id: Uuid) -> AppResult<booking::Model> {
    let current = find_booking(&state.db, booking_id).await?;

    if current.payment_status == PaymentStatus::Paid {
        // Duplicate webhook delivery is a no-op
        return Ok(current);
    }
    lifecycle::check_transition(&current, BookingStatus::Confirmed)?;

    let changes = booking::ActiveModel {
        payment_status: Set(PaymentStatus::Paid),
        status: Set(BookingStatus::Confirmed),
        ..Default::default()
    };
    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        booking_id,
        "payment_confirmed",
        "payment_webhook",
        Some(current.status.as_str().to_string()),
        Some(BookingStatus::Confirmed.as_str().to_string()),
    )
    .await;

    notify::dispatch(
        &state.config,
        Notification::StatusChanged {
            booking_id,
            reference: current.reference.clone(),
            old_status: current.status.as_str().to_string(),
            new_status: BookingStatus::Confirmed.as_str().to_string(),
        },
    );

    find_booking(&state.db, booking_id).await
}

/// Guard for the one-shot customer rating: range check, completed bookings
/// only, and an existing rating is never overwritten.
pub fn check_rating(booking: &booking::Model, rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    if booking.customer_rating.is_some() {
        return Err(AppError::AlreadyRated);
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::BadRequest(
            "Only completed bookings can be rated".to_string(),
        ));
    }
    Ok(())
}

/// One-time customer rating. A repeat submission fails with `AlreadyRated`
/// and leaves the stored rating untouched.
pub async fn submit_rating(
    state: &AppState,
    reference: &str,
    rating: i32,
    feedback: Option<String>,
) -> AppResult<booking::Model> {
    let current = find_by_reference(&state.db, reference).await?;
    check_rating(&current, rating)?;

    let changes = booking::ActiveModel {
        customer_rating: Set(Some(rating)),
        customer_feedback: Set(feedback),
        ..Default::default()
    };
    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        current.id,
        "rating_submitted",
        "customer",
        None,
        Some(rating.to_string()),
    )
    .await;

    if let Some(driver_id) = current.assigned_driver_id {
        if let Err(err) = roll_driver_rating(&state.db, driver_id, rating).await {
            tracing::error!(%driver_id, error = %err, "failed to update driver rating");
        }
    }

    find_booking(&state.db, current.id).await
}

/// Fold a new rating into the driver's rolling average.
async fn roll_driver_rating(
    db: &DatabaseConnection,
    driver_id: Uuid,
    rating: i32,
) -> AppResult<()> {
    let Some(drv) = driver::Entity::find_by_id(driver_id).one(db).await? else {
        return Ok(());
    };

    let total = drv.total_ratings + 1;
    let average =
        (drv.average_rating * f64::from(drv.total_ratings) + f64::from(rating)) / f64::from(total);

    let mut active: driver::ActiveModel = drv.into();
    active.average_rating = Set(average);
    active.total_ratings = Set(total);
    active.update(db).await?;
    Ok(())
}

/// Replace the free-form operator notes on a booking.
pub async fn set_admin_notes(
    state: &AppState,
    booking_id: Uuid,
    notes: Option<String>,
    actor: &str,
) -> AppResult<booking::Model> {
    let current = find_booking(&state.db, booking_id).await?;

    let changes = booking::ActiveModel {
        admin_notes: Set(notes.clone()),
        ..Default::default()
    };
    update_guarded(&state.db, &current, changes).await?;

    record_history(
        &state.db,
        booking_id,
        "admin_notes_updated",
        actor,
        current.admin_notes.clone(),
        notes,
    )
    .await;

    find_booking(&state.db, booking_id).await
}

pub async fn add_note(
    state: &AppState,
    booking_id: Uuid,
    author: &str,
    body: String,
) -> AppResult<booking_note::Model> {
    // Ensure the booking exists before attaching a note
    find_booking(&state.db, booking_id).await?;

    let note = booking_note::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        author: Set(author.to_string()),
        body: Set(body),
        ..Default::default()
    };
    let created = note.insert(&state.db).await?;

    record_history(
        &state.db,
        booking_id,
        "note_added",
        author,
        None,
        None,
    )
    .await;

    Ok(created)
}
