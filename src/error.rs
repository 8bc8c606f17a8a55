use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Booking lifecycle
    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("{0}")]
    AssignmentRequired(String),

    // Dispatch
    #[error("fleet '{0}' is inactive")]
    FleetInactive(String),

    #[error("booking is not assignable in status '{0}'")]
    BookingNotAssignable(String),

    #[error("driver '{0}' is not available")]
    DriverUnavailable(String),

    #[error("vehicle '{0}' is not available")]
    VehicleUnavailable(String),

    // Tracking
    #[error("booking has no assigned driver")]
    NoDriverAssigned,

    #[error("tracking session has expired")]
    SessionExpired,

    // Invoicing
    #[error("invoice in status '{0}' cannot be edited")]
    InvoiceLocked(String),

    // Rating
    #[error("booking has already been rated")]
    AlreadyRated,

    // Optimistic concurrency
    #[error("booking was modified concurrently, re-fetch and retry")]
    ConcurrentModification,

    // Storage failures after retry exhaustion; distinct from the domain
    // errors so clients can tell "invalid request" from "try again"
    #[error("service temporarily unavailable")]
    Unavailable,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error kind used in the JSON body
    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::AssignmentRequired(_) => "assignment_required",
            AppError::FleetInactive(_) => "fleet_inactive",
            AppError::BookingNotAssignable(_) => "booking_not_assignable",
            AppError::DriverUnavailable(_) => "driver_unavailable",
            AppError::VehicleUnavailable(_) => "vehicle_unavailable",
            AppError::NoDriverAssigned => "no_driver_assigned",
            AppError::SessionExpired => "session_expired",
            AppError::InvoiceLocked(_) => "invoice_locked",
            AppError::AlreadyRated => "already_rated",
            AppError::ConcurrentModification => "concurrent_modification",
            AppError::Unavailable => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::AssignmentRequired(_)
            | AppError::NoDriverAssigned => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::InvalidTransition { .. }
            | AppError::FleetInactive(_)
            | AppError::BookingNotAssignable(_)
            | AppError::DriverUnavailable(_)
            | AppError::VehicleUnavailable(_)
            | AppError::InvoiceLocked(_)
            | AppError::AlreadyRated
            | AppError::ConcurrentModification => StatusCode::CONFLICT,
            AppError::SessionExpired => StatusCode::GONE,
            AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            // Connectivity trouble is retriable by the client, unlike a
            // genuine internal failure
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => AppError::Unavailable,
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_are_client_recoverable() {
        let errors = [
            AppError::InvalidTransition {
                from: "pending".into(),
                to: "completed".into(),
            },
            AppError::FleetInactive("f1".into()),
            AppError::BookingNotAssignable("completed".into()),
            AppError::DriverUnavailable("d1".into()),
            AppError::VehicleUnavailable("v1".into()),
            AppError::InvoiceLocked("issued".into()),
            AppError::AlreadyRated,
            AppError::ConcurrentModification,
            AppError::SessionExpired,
            AppError::NoDriverAssigned,
            AppError::AssignmentRequired("driver and vehicle".into()),
        ];

        for err in errors {
            assert!(err.status_code().is_client_error(), "{:?}", err.kind());
        }
    }

    #[test]
    fn unavailable_is_distinct_from_domain_errors() {
        assert_eq!(
            AppError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
