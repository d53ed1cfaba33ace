use serde::{Deserialize, Serialize};

/// JWT payload carried by every authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id (`users.id`); teachers and students share the same table.
    pub sub: i64,
    /// Expiry as a unix timestamp.
    pub exp: usize,
    /// Admins bypass the class-ownership check.
    pub admin: bool,
}

/// Verified claims, inserted into request extensions by the auth guards.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
