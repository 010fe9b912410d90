use crate::error::{AppError, AppResult};
use crate::middlewares::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

/// Verifies bearer tokens minted by the identity provider (shared HS256 secret).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a token; used by operator tooling and tests.
    pub fn generate_access_token(
        &self,
        user_id: i64,
        role: UserRole,
        expires_in_secs: i64,
    ) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)?;

        if claims.sub.parse::<i64>().is_err() {
            return Err(AppError::NotAuthenticated);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_role() {
        let jwt = JwtService::new("test-secret");
        let token = jwt
            .generate_access_token(42, UserRole::EventLeader, 3600)
            .unwrap();
        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, UserRole::EventLeader);
    }

    #[test]
    fn rejects_foreign_secret_and_expired_tokens() {
        let ours = JwtService::new("ours");
        let theirs = JwtService::new("theirs");
        let token = theirs.generate_access_token(1, UserRole::Admin, 3600).unwrap();
        assert!(ours.verify_access_token(&token).is_err());

        let expired = ours.generate_access_token(1, UserRole::Admin, -3600).unwrap();
        assert!(ours.verify_access_token(&expired).is_err());
    }
}
