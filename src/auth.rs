use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Actor roles recognized by the platform. Every operation declares exactly
/// one required role, enforced once at the routing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Student,
    Manager,
    Delivery,
}

/// Claims carried by the bearer token minted by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// External user id.
    pub sub: i32,
    pub role: UserRole,
    pub exp: usize,
}

pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or("canteen-dev-secret".to_string())
}

pub fn decode_token(token: &str) -> Result<Claims> {
    decode_token_with_secret(token, &jwt_secret())
}

fn decode_token_with_secret(token: &str, secret: &str) -> Result<Claims> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .context("Failed to decode token")?;
    Ok(data.claims)
}

/// Mints a token for the given user. The real identity provider owns token
/// issuance; this exists for local development and tests.
pub fn encode_token(user_id: i32, role: UserRole, expires_in_secs: i64) -> Result<String> {
    encode_token_with_secret(user_id, role, expires_in_secs, &jwt_secret())
}

fn encode_token_with_secret(
    user_id: i32,
    role: UserRole,
    expires_in_secs: i64,
    secret: &str,
) -> Result<String> {
    let exp = (chrono::Utc::now().timestamp() + expires_in_secs) as usize;
    let claims = Claims {
        sub: user_id,
        role,
        exp,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_claims() {
        let token = encode_token_with_secret(42, UserRole::Student, 3600, "test-secret").unwrap();
        let claims = decode_token_with_secret(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, UserRole::Student);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = encode_token_with_secret(1, UserRole::Manager, 3600, "secret-a").unwrap();
        assert!(decode_token_with_secret(&token, "secret-b").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token_with_secret(1, UserRole::Delivery, -120, "test-secret").unwrap();
        assert!(decode_token_with_secret(&token, "test-secret").is_err());
    }

    #[test]
    fn roles_serialize_uppercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Delivery).unwrap(),
            "\"DELIVERY\""
        );
    }
}
