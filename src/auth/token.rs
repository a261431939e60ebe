//! Signed session tokens carried in the session cookie

use crate::error::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Session ID in the server-side store
    pub sid: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// HS256 signer keyed by the configured session secret
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token for a session that expires at `expires_at`
    pub fn sign(&self, session_id: &str, expires_at: chrono::DateTime<chrono::Utc>) -> Result<String> {
        let claims = SessionClaims {
            sid: session_id.to_string(),
            iat: chrono::Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Validate signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_one_hour() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now() + chrono::Duration::hours(1)
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = SessionSigner::new("secret");
        let token = signer.sign("session-1", in_one_hour()).expect("Failed to sign");
        let claims = signer.verify(&token).expect("Failed to verify");

        assert_eq!(claims.sid, "session-1");
        assert!(claims.exp > claims.iat);
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = SessionSigner::new("one").sign("s", in_one_hour()).unwrap();
        assert!(SessionSigner::new("two").verify(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let signer = SessionSigner::new("secret");
        let token = signer.sign("s", in_one_hour()).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(signer.verify(&tampered).is_err());
        assert!(signer.verify("invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = SessionSigner::new("secret");
        // Beyond the default validation leeway
        let token = signer
            .sign("s", chrono::Utc::now() - chrono::Duration::minutes(10))
            .unwrap();
        assert!(signer.verify(&token).is_err());
    }
}
