use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access-token claims. The subject is the account email; `adm` carries
/// the admin flag at issue time so middleware and the rate limiter can
/// classify a caller without a store lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // account email
    pub adm: bool,          // admin flag at issue time
    pub iat: i64,           // issued at
    pub exp: i64,           // expiration time
}

#[derive(Clone)]
pub struct JwtService {
    secret: String,
    access_token_duration: Duration,
}

impl JwtService {
    pub fn new(secret: String, access_token_expire_minutes: i64) -> Self {
        Self {
            secret,
            access_token_duration: Duration::minutes(access_token_expire_minutes),
        }
    }

    pub fn create_access_token(&self, email: &str, is_admin: bool) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + self.access_token_duration;

        let claims = Claims {
            sub: email.to_string(),
            adm: is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Decode and verify a token. Signature must match exactly and
    /// expiry is checked with zero leeway.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    pub fn get_access_token_duration_secs(&self) -> i64 {
        self.access_token_duration.num_seconds()
    }
}
