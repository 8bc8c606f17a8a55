//! Booking and invoice status machines.
//!
//! Every entry point that moves a booking or invoice between states goes
//! through this module, so the transition rules exist exactly once.

use crate::entities::booking::{self, BookingStatus};
use crate::entities::invoice::InvoiceStatus;
use crate::error::{AppError, AppResult};

/// Terminal states: nothing moves out of these.
pub fn is_terminal(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::Completed
            | BookingStatus::Cancelled
            | BookingStatus::NoShow
            | BookingStatus::DriverNoShow
            | BookingStatus::CustomerNoShow
    )
}

fn is_off_ramp(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::Cancelled
            | BookingStatus::NoShow
            | BookingStatus::DriverNoShow
            | BookingStatus::CustomerNoShow
    )
}

/// The forward successor of each status on the happy path.
fn forward_successor(status: BookingStatus) -> Option<BookingStatus> {
    match status {
        BookingStatus::Pending => Some(BookingStatus::Confirmed),
        BookingStatus::Confirmed => Some(BookingStatus::Assigned),
        BookingStatus::Assigned => Some(BookingStatus::Accepted),
        BookingStatus::Accepted => Some(BookingStatus::EnRoute),
        BookingStatus::EnRoute => Some(BookingStatus::Arrived),
        BookingStatus::Arrived => Some(BookingStatus::InProgress),
        BookingStatus::InProgress => Some(BookingStatus::Completed),
        _ => None,
    }
}

/// Whether `target` is a legal successor of `current`.
///
/// Legal edges are the forward chain, cancellation/no-show off-ramps from any
/// non-terminal state, and `accepted -> assigned` (fleet re-assignment).
pub fn is_legal(current: BookingStatus, target: BookingStatus) -> bool {
    if is_terminal(current) {
        return false;
    }
    if is_off_ramp(target) {
        return true;
    }
    // Re-assignment to a different fleet drops an accepted job back
    if current == BookingStatus::Accepted && target == BookingStatus::Assigned {
        return true;
    }
    forward_successor(current) == Some(target)
}

/// Validate a transition against the graph and the cross-cutting assignment
/// preconditions:
/// - into `assigned`: the fleet must already be set;
/// - into `en_route`: both driver and vehicle must be set.
pub fn check_transition(booking: &booking::Model, target: BookingStatus) -> AppResult<()> {
    if !is_legal(booking.status, target) {
        return Err(AppError::InvalidTransition {
            from: booking.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }

    match target {
        BookingStatus::Assigned if booking.assigned_fleet_id.is_none() => {
            Err(AppError::AssignmentRequired(
                "a fleet must be assigned before the booking can move to 'assigned'".to_string(),
            ))
        }
        BookingStatus::EnRoute if !booking.has_driver_and_vehicle() => {
            Err(AppError::AssignmentRequired(
                "driver and vehicle must be assigned before the booking can go en route"
                    .to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Which milestone timestamp a transition stamps, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Assigned,
    Accepted,
    Completed,
}

pub fn milestone_for(target: BookingStatus) -> Option<Milestone> {
    match target {
        BookingStatus::Assigned => Some(Milestone::Assigned),
        BookingStatus::Accepted => Some(Milestone::Accepted),
        BookingStatus::Completed => Some(Milestone::Completed),
        _ => None,
    }
}

/// Invoice status machine: draft -> pending_approval -> approved -> issued
/// -> paid, with cancelled reachable from any pre-paid state.
pub fn invoice_transition_legal(current: InvoiceStatus, target: InvoiceStatus) -> bool {
    use InvoiceStatus::*;
    match (current, target) {
        (Draft, PendingApproval)
        | (PendingApproval, Approved)
        | (Approved, Issued)
        | (Issued, Paid) => true,
        (Paid, _) | (Cancelled, _) => false,
        (_, Cancelled) => true,
        _ => false,
    }
}

/// Only drafts may have line items or tax rate edited.
pub fn invoice_editable(status: InvoiceStatus) -> bool {
    status == InvoiceStatus::Draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn booking_in(status: BookingStatus) -> booking::Model {
        booking::Model {
            id: Uuid::new_v4(),
            reference: "ATB-TEST01".to_string(),
            customer_name: "Jo Passenger".to_string(),
            customer_email: "jo@example.com".to_string(),
            customer_phone: None,
            pickup_location: "Airport T2".to_string(),
            pickup_lat: None,
            pickup_lng: None,
            dropoff_location: "City Hotel".to_string(),
            dropoff_lat: None,
            dropoff_lng: None,
            pickup_time: Utc::now().into(),
            passengers: 2,
            luggage: 2,
            vehicle_category: "sedan".to_string(),
            flight_number: None,
            child_seats: 0,
            customer_price: Decimal::new(8000, 2),
            driver_price: Decimal::new(5000, 2),
            status,
            payment_status: crate::entities::booking::PaymentStatus::Paid,
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

    const ALL: [BookingStatus; 12] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::Accepted,
        BookingStatus::EnRoute,
        BookingStatus::Arrived,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
        BookingStatus::DriverNoShow,
        BookingStatus::CustomerNoShow,
    ];

    #[test]
    fn happy_path_is_legal() {
        let path = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Assigned,
            BookingStatus::Accepted,
            BookingStatus::EnRoute,
            BookingStatus::Arrived,
            BookingStatus::InProgress,
            BookingStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(is_legal(pair[0], pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_exit_from_terminal_states() {
        for from in ALL.iter().copied().filter(|s| is_terminal(*s)) {
            for to in ALL {
                assert!(!is_legal(from, to), "{:?} -> {:?} must be illegal", from, to);
            }
        }
    }

    #[test]
    fn off_ramps_reachable_from_every_non_terminal_state() {
        for from in ALL.iter().copied().filter(|s| !is_terminal(*s)) {
            assert!(is_legal(from, BookingStatus::Cancelled));
            assert!(is_legal(from, BookingStatus::NoShow));
            assert!(is_legal(from, BookingStatus::DriverNoShow));
            assert!(is_legal(from, BookingStatus::CustomerNoShow));
        }
    }

    #[test]
    fn skipping_ahead_is_illegal() {
        assert!(!is_legal(BookingStatus::Pending, BookingStatus::Assigned));
        assert!(!is_legal(BookingStatus::Confirmed, BookingStatus::Accepted));
        assert!(!is_legal(BookingStatus::Assigned, BookingStatus::EnRoute));
        assert!(!is_legal(BookingStatus::Accepted, BookingStatus::Completed));
        assert!(!is_legal(BookingStatus::EnRoute, BookingStatus::InProgress));
    }

    #[test]
    fn moving_backwards_is_illegal_except_reassignment() {
        assert!(is_legal(BookingStatus::Accepted, BookingStatus::Assigned));
        assert!(!is_legal(BookingStatus::Assigned, BookingStatus::Confirmed));
        assert!(!is_legal(BookingStatus::EnRoute, BookingStatus::Accepted));
        assert!(!is_legal(BookingStatus::Completed, BookingStatus::InProgress));
    }

    #[test]
    fn assigned_requires_fleet() {
        let mut b = booking_in(BookingStatus::Confirmed);
        let err = check_transition(&b, BookingStatus::Assigned).unwrap_err();
        assert!(matches!(err, AppError::AssignmentRequired(_)));

        b.assigned_fleet_id = Some(Uuid::new_v4());
        assert!(check_transition(&b, BookingStatus::Assigned).is_ok());
    }

    #[test]
    fn en_route_requires_driver_and_vehicle() {
        let mut b = booking_in(BookingStatus::Accepted);
        b.assigned_fleet_id = Some(Uuid::new_v4());

        let err = check_transition(&b, BookingStatus::EnRoute).unwrap_err();
        assert!(matches!(err, AppError::AssignmentRequired(_)));

        // Driver alone is not enough
        b.assigned_driver_id = Some(Uuid::new_v4());
        assert!(check_transition(&b, BookingStatus::EnRoute).is_err());

        b.assigned_vehicle_id = Some(Uuid::new_v4());
        assert!(check_transition(&b, BookingStatus::EnRoute).is_ok());
    }

    #[test]
    fn cancellation_needs_no_assignment() {
        let b = booking_in(BookingStatus::Pending);
        assert!(check_transition(&b, BookingStatus::Cancelled).is_ok());
        assert!(check_transition(&b, BookingStatus::CustomerNoShow).is_ok());
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let b = booking_in(BookingStatus::Pending);
        match check_transition(&b, BookingStatus::Completed) {
            Err(AppError::InvalidTransition { from, to }) => {
                assert_eq!(from, "pending");
                assert_eq!(to, "completed");
            }
            other => panic!("expected InvalidTransition, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn milestones_cover_assignment_acceptance_completion() {
        assert_eq!(milestone_for(BookingStatus::Assigned), Some(Milestone::Assigned));
        assert_eq!(milestone_for(BookingStatus::Accepted), Some(Milestone::Accepted));
        assert_eq!(milestone_for(BookingStatus::Completed), Some(Milestone::Completed));
        assert_eq!(milestone_for(BookingStatus::EnRoute), None);
    }

    #[test]
    fn invoice_chain_and_cancellation() {
        use InvoiceStatus::*;
        assert!(invoice_transition_legal(Draft, PendingApproval));
        assert!(invoice_transition_legal(PendingApproval, Approved));
        assert!(invoice_transition_legal(Approved, Issued));
        assert!(invoice_transition_legal(Issued, Paid));

        for s in [Draft, PendingApproval, Approved, Issued] {
            assert!(invoice_transition_legal(s, Cancelled));
        }
        assert!(!invoice_transition_legal(Paid, Cancelled));
        assert!(!invoice_transition_legal(Cancelled, Draft));
        assert!(!invoice_transition_legal(Draft, Issued));
    }

    #[test]
    fn only_draft_invoices_editable() {
        assert!(invoice_editable(InvoiceStatus::Draft));
        for s in [
            InvoiceStatus::PendingApproval,
            InvoiceStatus::Approved,
            InvoiceStatus::Issued,
            InvoiceStatus::Paid,
            InvoiceStatus::Cancelled,
        ] {
            assert!(!invoice_editable(s));
        }
    }
}
