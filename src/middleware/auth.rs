use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Validate the bearer token and stash the claims in request extensions for
/// the role guards and handlers downstream.
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn claims_of(request: &Request) -> AppResult<&Claims> {
    request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))
}

pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    let claims = claims_of(&request)?;
    if claims.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(request).await)
}

/// Admit fleet-admin accounts, and platform admins carrying an
/// acting-as-fleet grant (impersonation). Which fleet the request operates
/// as comes from `Claims::effective_fleet`.
pub async fn require_fleet(request: Request, next: Next) -> AppResult<Response> {
    let claims = claims_of(&request)?;
    let allowed = match claims.role {
        UserRole::Fleet => claims.fleet_id.is_some(),
        UserRole::Admin => claims.acting_as_fleet.is_some(),
        UserRole::Customer => false,
    };
    if !allowed {
        return Err(AppError::Forbidden("Fleet access required".to_string()));
    }
    Ok(next.run(request).await)
}
