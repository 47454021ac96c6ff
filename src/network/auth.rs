//! Player Identity from JWTs
//!
//! Join requests carry a JWT issued by the session bootstrapper. The server
//! only validates tokens; the subject becomes the player id and the
//! optional `name` claim is the display name collected before round 1.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::game::registry::PlayerIdentity;
use crate::game::state::PlayerId;

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected issuer claim ("iss"). If None, any issuer accepted.
    pub issuer: Option<String>,
    /// Expected audience claim ("aud"). If None, any audience accepted.
    pub audience: Option<String>,
    /// RS256 public key in PEM format.
    pub public_key_pem: Option<String>,
    /// HS256 shared secret.
    pub secret: Option<String>,
    /// Skip expiry validation (testing only).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            issuer: std::env::var("AUTH_ISSUER").ok(),
            audience: std::env::var("AUTH_AUDIENCE").ok(),
            public_key_pem: std::env::var("AUTH_PUBLIC_KEY_PEM").ok(),
            secret: std::env::var("AUTH_SECRET").ok(),
            skip_expiry: std::env::var("AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Check if a verification key is configured.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Claims expected in a join token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the participant id from the bootstrapper.
    pub sub: String,
    /// Display name collected before the game. May be blank.
    #[serde(default)]
    pub name: Option<String>,
    /// Expiry timestamp (Unix seconds).
    #[serde(default)]
    pub exp: u64,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Stable player id derived from the subject.
    pub fn player_id(&self) -> PlayerId {
        let mut hasher = Sha256::new();
        hasher.update(b"guess-round-player:");
        hasher.update(self.sub.as_bytes());
        let hash = hasher.finalize();

        let mut id = [0u8; 16];
        id.copy_from_slice(&hash[..16]);
        PlayerId::new(id)
    }

    /// Identity handed to the group registry. The registry substitutes
    /// the default name when the claim is blank.
    pub fn identity(&self) -> PlayerIdentity {
        PlayerIdentity::new(self.player_id(), self.name.clone().unwrap_or_default())
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No verification key configured.
    #[error("authentication not configured")]
    NotConfigured,
    /// Token format is invalid.
    #[error("invalid token format")]
    InvalidFormat,
    /// Signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// Token has expired.
    #[error("token expired")]
    Expired,
    /// Issuer mismatch.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Audience mismatch.
    #[error("invalid audience")]
    InvalidAudience,
    /// Required claim is missing.
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Any other decoding failure.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Validates join tokens against a fixed key and rule set.
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
    skip_expiry: bool,
}

impl TokenValidator {
    /// Build the key and rules once from config.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let (key, algorithm) = if let Some(pem) = &config.public_key_pem {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AuthError::DecodeError(format!("invalid public key: {}", e)))?;
            (key, Algorithm::RS256)
        } else if let Some(secret) = &config.secret {
            (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
        } else {
            return Err(AuthError::NotConfigured);
        };

        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims = HashSet::new();
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if config.skip_expiry {
            validation.validate_exp = false;
        }

        Ok(Self {
            key,
            validation,
            skip_expiry: config.skip_expiry,
        })
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::MissingClaim("sub".into()));
        }

        // `exp` is optional in the rules above, so check it here when present.
        if !self.skip_expiry && claims.exp > 0 && unix_now() > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
