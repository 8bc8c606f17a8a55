use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quote::{quote_price, QuoteRequest};
use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::error::{AppError, AppResult};
use crate::services::bookings::{self, NewBooking};
use crate::services::tracking::{self, TrackingSnapshot};
use crate::AppState;

// ============ Quotes ============

#[derive(Debug, Deserialize)]
pub struct QuotePayload {
    pub vehicle_category: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub passengers: i32,
    #[serde(default)]
    pub child_seats: i32,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub vehicle_category: String,
    pub customer_price: Decimal,
    pub distance_km: Option<i64>,
}

/// Price a route/vehicle/extras combination. Stateless; nothing is stored.
pub async fn get_quote(Json(payload): Json<QuotePayload>) -> AppResult<Json<QuoteResponse>> {
    if payload.passengers <= 0 {
        return Err(AppError::BadRequest(
            "At least one passenger is required".to_string(),
        ));
    }

    let quote = quote_price(&QuoteRequest {
        vehicle_category: payload.vehicle_category.clone(),
        pickup_lat: payload.pickup_lat,
        pickup_lng: payload.pickup_lng,
        dropoff_lat: payload.dropoff_lat,
        dropoff_lng: payload.dropoff_lng,
        passengers: payload.passengers,
        child_seats: payload.child_seats,
    });

    Ok(Json(QuoteResponse {
        vehicle_category: payload.vehicle_category,
        customer_price: quote.customer_price,
        distance_km: quote.distance_km,
    }))
}

// ============ Booking creation & payment ============

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub pickup_location: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_location: String,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub pickup_time: DateTime<Utc>,
    pub passengers: i32,
    #[serde(default)]
    pub luggage: i32,
    pub vehicle_category: String,
    pub flight_number: Option<String>,
    #[serde(default)]
    pub child_seats: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub id: Uuid,
    pub reference: String,
    pub status: BookingStatus,
    pub customer_price: Decimal,
}

/// Create a booking in `pending`; payment confirmation moves it to
/// `confirmed` via the webhook below.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingCreatedResponse>> {
    let created = bookings::create_booking(
        &state,
        NewBooking {
            customer_name: payload.customer_name,
            customer_email: payload.customer_email,
            customer_phone: payload.customer_phone,
            pickup_location: payload.pickup_location,
            pickup_lat: payload.pickup_lat,
            pickup_lng: payload.pickup_lng,
            dropoff_location: payload.dropoff_location,
            dropoff_lat: payload.dropoff_lat,
            dropoff_lng: payload.dropoff_lng,
            pickup_time: payload.pickup_time,
            passengers: payload.passengers,
            luggage: payload.luggage,
            vehicle_category: payload.vehicle_category,
            flight_number: payload.flight_number,
            child_seats: payload.child_seats,
        },
    )
    .await?;

    Ok(Json(BookingCreatedResponse {
        id: created.id,
        reference: created.reference,
        status: created.status,
        customer_price: created.customer_price,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentSessionRequest {
    pub booking_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PaymentSessionResponse {
    pub redirect_url: String,
}

/// Hand off to the payment collaborator: returns the URL the customer is
/// redirected to. The collaborator calls back on `/payments/webhook`.
pub async fn create_payment_session(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentSessionRequest>,
) -> AppResult<Json<PaymentSessionResponse>> {
    let booking = bookings::find_booking(&state.db, payload.booking_id).await?;

    if booking.payment_status == PaymentStatus::Paid {
        return Err(AppError::Conflict("Booking is already paid".to_string()));
    }

    Ok(Json(PaymentSessionResponse {
        redirect_url: format!(
            "{}/checkout/{}?amount={}",
            state.config.payment_base_url, booking.reference, booking.customer_price
        ),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PaymentWebhookPayload {
    pub booking_id: Uuid,
    pub status: String,
}

/// Payment confirmation webhook, authenticated by a shared secret header.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentWebhookPayload>,
) -> AppResult<Json<booking::Model>> {
    let secret = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook secret".to_string()))?;

    if secret != state.config.payment_webhook_secret {
        return Err(AppError::Unauthorized("Invalid webhook secret".to_string()));
    }

    if payload.status != "paid" {
        return Err(AppError::BadRequest(format!(
            "Unhandled payment status '{}'",
            payload.status
        )));
    }

    let updated = bookings::confirm_payment(&state, payload.booking_id).await?;
    Ok(Json(updated))
}

// ============ Public tracking & rating ============

/// Live journey snapshot for the customer tracking page. Reachable with only
/// the booking reference; lookups are exact-match, never fuzzy.
pub async fn get_tracking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<Json<TrackingSnapshot>> {
    let snapshot = tracking::snapshot_by_reference(&state, &reference).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct PingPayload {
    pub lat: f64,
    pub lng: f64,
}

/// Driver location ping, authenticated by the unguessable session token.
pub async fn record_ping(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<PingPayload>,
) -> AppResult<Json<serde_json::Value>> {
    if !(-90.0..=90.0).contains(&payload.lat) || !(-180.0..=180.0).contains(&payload.lng) {
        return Err(AppError::BadRequest("Invalid coordinates".to_string()));
    }

    let ping = tracking::record_ping(&state, &token, payload.lat, payload.lng).await?;
    Ok(Json(serde_json::json!({
        "recorded_at": ping.recorded_at,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RatingPayload {
    pub rating: i32,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub reference: String,
    pub rating: i32,
}

/// One-time rating for a completed booking; a repeat fails with AlreadyRated.
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(payload): Json<RatingPayload>,
) -> AppResult<Json<RatingResponse>> {
    let updated =
        bookings::submit_rating(&state, &reference, payload.rating, payload.feedback).await?;

    Ok(Json(RatingResponse {
        reference: updated.reference,
        // Freshly stored above, present by construction
        rating: updated.customer_rating.unwrap_or(payload.rating),
    }))
}
