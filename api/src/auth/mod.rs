pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::env;

/// Generates a JWT and its expiry timestamp for a given user.
///
/// Token issuance endpoints live in the identity service; this exists for the
/// guards' counterpart and for tests that need authenticated requests.
pub fn generate_jwt(user_id: i64, admin: bool) -> (String, String) {
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let jwt_duration_minutes: i64 = env::var("JWT_DURATION_MINUTES")
        .unwrap_or_else(|_| "60".into())
        .parse()
        .expect("JWT_DURATION_MINUTES must be a valid integer");

    let expiry = Utc::now() + Duration::minutes(jwt_duration_minutes);
    let exp_timestamp = expiry.timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        admin,
        exp: exp_timestamp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}
