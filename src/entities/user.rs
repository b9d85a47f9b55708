use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Su,
    User,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        plain_password: &str,
        role: Role,
    ) -> Result<Self, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let password = Argon2::default()
            .hash_password(plain_password.as_bytes(), &salt)?
            .to_string();

        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            password,
            role,
            created_at: Utc::now(),
        })
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.password) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
