use crate::domain::{Actor, DomainError, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    pub exp: usize,
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Actor::User {
            id: claims.user_id,
            username: claims.username,
            is_staff: claims.is_staff,
        }
    }
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, DomainError> {
        tracing::debug!(
            "Initializing JwtService with secret length: {}",
            secret.len()
        );

        if secret.is_empty() {
            return Err(DomainError::InternalError(
                "JWT secret cannot be empty".to_string(),
            ));
        }

        if secret.len() < 32 {
            tracing::warn!(
                "JWT secret is too short ({} chars). Minimum recommended is 32 chars.",
                secret.len()
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(24),
        })
    }

    pub fn generate_token(&self, user: &User) -> Result<String, DomainError> {
        tracing::debug!(
            "Generating token for user_id: {}, username: {}",
            user.id,
            user.username
        );

        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| DomainError::InternalError("Token expiry overflow".to_string()))?
            .timestamp() as usize;

        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {}", e);
            DomainError::InternalError(format!("Failed to generate token: {}", e))
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, DomainError> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(token_data) => {
                tracing::debug!("Token verified for user_id: {}", token_data.claims.user_id);
                Ok(token_data.claims)
            }
            Err(e) => {
                tracing::warn!("Token verification failed: {}", e);
                Err(DomainError::AuthenticationRequired)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 42,
            username: "writer".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: "writer@example.com".to_string(),
            password_hash: String::new(),
            is_staff: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_yields_actor() {
        let jwt = JwtService::new("a-test-secret-that-is-long-enough-1234").unwrap();
        let token = jwt.generate_token(&user()).unwrap();

        let actor = Actor::from(jwt.verify_token(&token).unwrap());
        assert_eq!(actor.id(), Some(42));
        assert!(actor.is_staff());
    }

    #[test]
    fn foreign_token_is_rejected() {
        let issuer = JwtService::new("first-secret-first-secret-first-secret").unwrap();
        let verifier = JwtService::new("other-secret-other-secret-other-secret").unwrap();
        let token = issuer.generate_token(&user()).unwrap();

        assert!(matches!(
            verifier.verify_token(&token),
            Err(DomainError::AuthenticationRequired)
        ));
    }
}
