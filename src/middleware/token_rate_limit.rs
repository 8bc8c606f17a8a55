use axum::body::Body;
use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};

use crate::middleware::rate_limit::rate_limit_error_handler;

/// Keys the limiter on the trailing path segment: the tracking token or
/// booking reference of the public endpoints. Limiting per token (rather
/// than per IP) blunts enumeration of the token space from many addresses.
#[derive(Debug, Clone, Copy)]
pub struct PathTokenExtractor;

impl KeyExtractor for PathTokenExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        req.uri()
            .path()
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub type TokenGovernorLayer = GovernorLayer<
    PathTokenExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// 30 requests per minute per token: a 2s polling page fits, a brute-force
/// scan does not.
pub fn create_token_governor() -> TokenGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(2000)
            .burst_size(30)
            .key_extractor(PathTokenExtractor)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trailing_segment() {
        let req = Request::builder()
            .uri("/api/customer/tracking/ATB-7KQ2M9")
            .body(())
            .unwrap();
        assert_eq!(
            PathTokenExtractor.extract(&req).unwrap(),
            "ATB-7KQ2M9".to_string()
        );
    }

    #[test]
    fn rejects_empty_path() {
        let req = Request::builder().uri("/").body(()).unwrap();
        assert!(PathTokenExtractor.extract(&req).is_err());
    }
}
