//! End-to-end scenarios over the pure domain layer: a booking's journey from
//! payment through dispatch to settlement, exercised without a database.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use airport_transfer_backend::domain::lifecycle::{check_transition, is_legal, is_terminal};
use airport_transfer_backend::domain::money::{fleet_commission, invoice_totals};
use airport_transfer_backend::domain::quote::{quote_price, QuoteRequest};
use airport_transfer_backend::entities::booking::{self, BookingStatus, PaymentStatus};
use airport_transfer_backend::entities::fleet::{self, CommissionType, FleetStatus};
use airport_transfer_backend::entities::tracking_session::{self, TrackingStatus};
use airport_transfer_backend::error::AppError;
use airport_transfer_backend::services::bookings::{check_rating, check_version_guard};
use airport_transfer_backend::services::dispatch::{accept_outcome, AcceptOutcome};
use airport_transfer_backend::services::invoicing::{filter_uninvoiced, select_billable};
use airport_transfer_backend::services::tracking::session_expired;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn make_booking(status: BookingStatus) -> booking::Model {
    booking::Model {
        id: Uuid::new_v4(),
        reference: "ATB-X7K2P9".to_string(),
        customer_name: "Ada Byron".to_string(),
        customer_email: "ada@example.com".to_string(),
        customer_phone: None,
        pickup_location: "Heathrow T5".to_string(),
        pickup_lat: Some(51.4700),
        pickup_lng: Some(-0.4543),
        dropoff_location: "Paddington".to_string(),
        dropoff_lat: Some(51.5154),
        dropoff_lng: Some(-0.1755),
        pickup_time: (Utc::now() + Duration::hours(6)).into(),
        passengers: 2,
        luggage: 2,
        vehicle_category: "sedan".to_string(),
        flight_number: Some("BA117".to_string()),
        child_seats: 0,
        customer_price: d("80.00"),
        driver_price: d("50.00"),
        status,
        payment_status: PaymentStatus::Paid,
        assigned_fleet_id: None,
        assigned_driver_id: None,
        assigned_vehicle_id: None,
        customer_rating: None,
        customer_feedback: None,
        admin_notes: None,
        version: 0,
        created_at: Utc::now().into(),
        assigned_at: None,
        accepted_at: None,
        completed_at: None,
    }
}

fn make_fleet(commission_type: CommissionType, value: &str) -> fleet::Model {
    fleet::Model {
        id: Uuid::new_v4(),
        name: "Skyline Cars".to_string(),
        billing_email: "billing@skyline.example".to_string(),
        billing_phone: None,
        commission_type,
        commission_value: d(value),
        status: FleetStatus::Active,
        payment_terms_days: 14,
        created_at: Utc::now().into(),
    }
}

#[test]
fn booking_walks_the_full_happy_path() {
    let chain = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::Accepted,
        BookingStatus::EnRoute,
        BookingStatus::Arrived,
        BookingStatus::InProgress,
        BookingStatus::Completed,
    ];

    for pair in chain.windows(2) {
        assert!(
            is_legal(pair[0], pair[1]),
            "{:?} -> {:?} should be legal",
            pair[0],
            pair[1]
        );
    }
    assert!(is_terminal(BookingStatus::Completed));
}

#[test]
fn skipping_ahead_is_rejected() {
    let booking = make_booking(BookingStatus::Confirmed);

    match check_transition(&booking, BookingStatus::EnRoute) {
        Err(AppError::InvalidTransition { from, to }) => {
            assert_eq!(from, "confirmed");
            assert_eq!(to, "en_route");
        }
        other => panic!("expected InvalidTransition, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn en_route_needs_a_driver_and_a_vehicle() {
    let mut booking = make_booking(BookingStatus::Accepted);
    booking.assigned_fleet_id = Some(Uuid::new_v4());

    assert!(matches!(
        check_transition(&booking, BookingStatus::EnRoute),
        Err(AppError::AssignmentRequired(_))
    ));

    booking.assigned_driver_id = Some(Uuid::new_v4());
    booking.assigned_vehicle_id = Some(Uuid::new_v4());
    assert!(check_transition(&booking, BookingStatus::EnRoute).is_ok());
}

#[test]
fn accepted_job_can_fall_back_to_assigned_for_reassignment() {
    let mut booking = make_booking(BookingStatus::Accepted);
    booking.assigned_fleet_id = Some(Uuid::new_v4());

    assert!(check_transition(&booking, BookingStatus::Assigned).is_ok());

    // But not from further along
    let mut en_route = make_booking(BookingStatus::EnRoute);
    en_route.assigned_fleet_id = Some(Uuid::new_v4());
    assert!(!is_legal(en_route.status, BookingStatus::Assigned));
}

#[test]
fn accepting_twice_ends_up_where_accepting_once_did() {
    let mut booking = make_booking(BookingStatus::Assigned);
    booking.assigned_fleet_id = Some(Uuid::new_v4());

    // First accept moves the status and stamps accepted_at
    match accept_outcome(&booking).unwrap() {
        AcceptOutcome::Accept { stamp_accepted_at } => assert!(stamp_accepted_at),
        other => panic!("expected Accept, got {:?}", other),
    }
    booking.status = BookingStatus::Accepted;
    booking.accepted_at = Some(Utc::now().into());
    let first_stamp = booking.accepted_at;

    // A duplicate click succeeds without touching the record
    assert_eq!(accept_outcome(&booking).unwrap(), AcceptOutcome::NoOp);
    assert_eq!(booking.accepted_at, first_stamp);

    // Re-accepting after a re-assignment keeps the original stamp
    booking.status = BookingStatus::Assigned;
    match accept_outcome(&booking).unwrap() {
        AcceptOutcome::Accept { stamp_accepted_at } => assert!(!stamp_accepted_at),
        other => panic!("expected Accept, got {:?}", other),
    }

    // A job never assigned cannot be accepted at all
    let fresh = make_booking(BookingStatus::Confirmed);
    assert!(matches!(
        accept_outcome(&fresh),
        Err(AppError::BookingNotAssignable(_))
    ));
}

#[test]
fn rating_is_one_shot() {
    let mut booking = make_booking(BookingStatus::Completed);
    assert!(check_rating(&booking, 5).is_ok());

    booking.customer_rating = Some(5);
    for repeat in [1, 3, 5] {
        assert!(matches!(
            check_rating(&booking, repeat),
            Err(AppError::AlreadyRated)
        ));
    }
    // The stored rating survives every repeat untouched
    assert_eq!(booking.customer_rating, Some(5));
}

#[test]
fn rating_needs_a_completed_booking_and_a_valid_score() {
    let live = make_booking(BookingStatus::EnRoute);
    assert!(matches!(check_rating(&live, 4), Err(AppError::BadRequest(_))));

    let done = make_booking(BookingStatus::Completed);
    assert!(matches!(check_rating(&done, 0), Err(AppError::BadRequest(_))));
    assert!(matches!(check_rating(&done, 6), Err(AppError::BadRequest(_))));
}

#[test]
fn losing_a_version_race_is_a_concurrent_modification() {
    // Two writers read the same version; the winner's guarded update matches
    // its row, the loser's filter matches nothing
    assert!(check_version_guard(1).is_ok());
    assert!(matches!(
        check_version_guard(0),
        Err(AppError::ConcurrentModification)
    ));
}

#[test]
fn contested_invoice_generation_refuses_the_loser() {
    let contested = make_booking(BookingStatus::Completed);
    let eligible = vec![contested.clone()];

    // Winner takes the booking onto its invoice
    assert_eq!(select_billable(&eligible, &[contested.id]).unwrap().len(), 1);

    // The loser re-reads after the winner's line items are visible and is
    // refused instead of double-billing
    let after_win = filter_uninvoiced(eligible, &[contested.id]);
    assert!(matches!(
        select_billable(&after_win, &[contested.id]),
        Err(AppError::Conflict(_))
    ));
}

#[test]
fn cancellation_works_from_any_live_state_but_not_after_completion() {
    for status in [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::EnRoute,
        BookingStatus::InProgress,
    ] {
        assert!(is_legal(status, BookingStatus::Cancelled));
    }
    assert!(!is_legal(BookingStatus::Completed, BookingStatus::Cancelled));
    assert!(!is_legal(BookingStatus::Cancelled, BookingStatus::Confirmed));
}

#[test]
fn settlement_numbers_for_a_standard_job() {
    // Customer pays 80, driver payout 50, fleet on 15% commission
    let booking = make_booking(BookingStatus::Completed);
    assert_eq!(booking.profit(), d("30.00"));

    let fleet = make_fleet(CommissionType::Percentage, "15");
    let commission = fleet_commission(&fleet, booking.driver_price);
    assert_eq!(commission, d("7.50"));

    let totals = invoice_totals(booking.driver_price, commission, Decimal::ZERO);
    assert_eq!(totals.subtotal, d("50.00"));
    assert_eq!(totals.commission, d("7.50"));
    assert_eq!(totals.tax, d("0.00"));
    assert_eq!(totals.total, d("42.50"));
}

#[test]
fn tax_applies_after_commission() {
    let totals = invoice_totals(d("50.00"), d("7.50"), d("20"));
    assert_eq!(totals.tax, d("8.50"));
    assert_eq!(totals.total, d("51.00"));
}

#[test]
fn flat_commission_never_exceeds_the_subtotal() {
    let fleet = make_fleet(CommissionType::Flat, "120.00");
    assert_eq!(fleet_commission(&fleet, d("50.00")), d("50.00"));
}

#[test]
fn already_invoiced_bookings_are_filtered_out() {
    let a = make_booking(BookingStatus::Completed);
    let b = make_booking(BookingStatus::Completed);
    let invoiced = vec![a.id];

    let remaining = filter_uninvoiced(vec![a, b.clone()], &invoiced);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, b.id);

    // Billing the rest leaves nothing behind
    let none = filter_uninvoiced(remaining, &[b.id]);
    assert!(none.is_empty());
}

#[test]
fn tracking_dies_with_the_booking_and_with_its_ttl() {
    let now = Utc::now();
    let session = tracking_session::Model {
        id: Uuid::new_v4(),
        booking_id: Uuid::new_v4(),
        token: "t".repeat(32),
        status: TrackingStatus::Active,
        expires_at: (now + Duration::hours(24)).into(),
        created_at: now.into(),
    };

    assert!(!session_expired(&session, BookingStatus::EnRoute, now));
    // Terminal booking kills the link even inside the TTL
    assert!(session_expired(&session, BookingStatus::Completed, now));
    assert!(session_expired(&session, BookingStatus::Cancelled, now));
    // TTL elapsed
    assert!(session_expired(
        &session,
        BookingStatus::EnRoute,
        now + Duration::hours(25)
    ));
}

#[test]
fn quote_covers_the_driver_payout() {
    let quote = quote_price(&QuoteRequest {
        vehicle_category: "sedan".to_string(),
        pickup_lat: Some(51.4700),
        pickup_lng: Some(-0.4543),
        dropoff_lat: Some(51.5154),
        dropoff_lng: Some(-0.1755),
        passengers: 2,
        child_seats: 1,
    });

    assert!(quote.customer_price > quote.driver_price);
    assert!(quote.customer_price > Decimal::ZERO);
    // Two-decimal currency
    assert_eq!(quote.customer_price, quote.customer_price.round_dp(2));
}
