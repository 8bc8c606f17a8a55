use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::utils::jwt::Claims;

/// Type alias for IP-keyed governor layers used on public routes
pub type PublicGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// IP-based limiter for unauthenticated routes: 60 requests per minute,
/// enough for a tracking page polling every few seconds.
pub fn create_public_governor() -> PublicGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(60)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(config)
}

/// Key extractor for authenticated routes: limits per user id from the JWT
/// claims placed in extensions by `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type UserGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Per-user limiter for the fleet dashboard: 500 requests per 2 minutes is
/// comfortable for a jobs page polling every few seconds. Admin traffic
/// rides on the global IP limiter only.
pub fn create_fleet_governor() -> UserGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(120 * 2)
            .burst_size(500)
            .key_extractor(UserIdExtractor)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

/// Map governor refusals to a plain 429 without leaking limiter internals
pub fn rate_limit_error_handler(err: GovernorError) -> axum::response::Response {
    use axum::response::IntoResponse;

    match err {
        GovernorError::TooManyRequests { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response()
        }
        GovernorError::UnableToExtractKey => {
            (StatusCode::UNAUTHORIZED, "Unable to identify caller").into_response()
        }
        GovernorError::Other { code, msg, .. } => {
            (code, msg.unwrap_or_default()).into_response()
        }
    }
}
