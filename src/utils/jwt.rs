use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user id
    pub email: String,
    pub role: UserRole,
    /// Fleet managed by this account (fleet-admin users)
    pub fleet_id: Option<Uuid>,
    /// Capability grant: an admin acting as this fleet. Kept separate from
    /// `fleet_id` so the audit trail shows who really acted.
    pub acting_as_fleet: Option<Uuid>,
    pub exp: i64,        // expiration timestamp
    pub iat: i64,        // issued at timestamp
}

impl Claims {
    /// The fleet this request may operate as, if any.
    pub fn effective_fleet(&self) -> Option<Uuid> {
        match self.role {
            UserRole::Fleet => self.fleet_id,
            UserRole::Admin => self.acting_as_fleet,
            UserRole::Customer => None,
        }
    }

    /// Audit label recorded in booking history, e.g. "admin:<id> as fleet:<id>".
    pub fn actor_label(&self) -> String {
        let role = match self.role {
            UserRole::Admin => "admin",
            UserRole::Fleet => "fleet",
            UserRole::Customer => "customer",
        };
        match self.acting_as_fleet {
            Some(fleet) => format!("{}:{} as fleet:{}", role, self.sub, fleet),
            None => format!("{}:{}", role, self.sub),
        }
    }
}

pub fn create_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    fleet_id: Option<Uuid>,
    acting_as_fleet: Option<Uuid>,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        fleet_id,
        acting_as_fleet,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_impersonation() {
        let user = Uuid::new_v4();
        let fleet = Uuid::new_v4();
        let token = create_token(
            user,
            "ops@example.com",
            UserRole::Admin,
            None,
            Some(fleet),
            "test-secret",
            1,
        )
        .unwrap();

        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.effective_fleet(), Some(fleet));
        assert_eq!(
            claims.actor_label(),
            format!("admin:{} as fleet:{}", user, fleet)
        );
    }

    #[test]
    fn fleet_account_acts_as_own_fleet() {
        let fleet = Uuid::new_v4();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "fleet@example.com".to_string(),
            role: UserRole::Fleet,
            fleet_id: Some(fleet),
            acting_as_fleet: None,
            exp: 0,
            iat: 0,
        };
        assert_eq!(claims.effective_fleet(), Some(fleet));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = create_token(
            Uuid::new_v4(),
            "a@b.c",
            UserRole::Customer,
            None,
            None,
            "secret-a",
            1,
        )
        .unwrap();
        assert!(verify_token(&token, "secret-b").is_err());
    }
}
