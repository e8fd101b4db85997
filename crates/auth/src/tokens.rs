//! Token service: short-lived access tokens + longer-lived refresh tokens.
//!
//! Both token kinds carry the same identity payload (user id, email, role
//! snapshot) but are signed with **distinct secrets** and tagged with a
//! `typ` discriminator plus an issuer/audience pair, so neither can be
//! replayed in the other's slot.
//!
//! The role in a token is a snapshot taken at issuance. A server-side role
//! change takes effect only when the access token expires; this staleness
//! window (bounded by the access TTL) is accepted, documented behavior.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attest_core::UserId;

use crate::roles::Role;

/// Default access-token lifetime.
pub const ACCESS_TTL_MINUTES: i64 = 15;
/// Default refresh-token lifetime.
pub const REFRESH_TTL_DAYS: i64 = 7;

const ISSUER: &str = "attest";
const AUDIENCE: &str = "attest-clients";

/// Token kind discriminator embedded in the claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user identifier.
    pub sub: UserId,
    pub email: String,
    /// Role snapshot at issuance time.
    pub role: Role,
    pub typ: TokenType,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is invalid")]
    Invalid,

    #[error("wrong token type for this operation")]
    WrongType,
}

/// An issued access/refresh pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds (for client-side scheduling).
    pub expires_in: i64,
}

/// Token service configuration (secrets + lifetimes).
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(REFRESH_TTL_DAYS),
        }
    }
}

/// Issues and verifies token pairs. Pure computation; no IO.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue a fresh access/refresh pair for an identity snapshot.
    pub fn issue_pair(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let access = self.encode(user_id, email, role, TokenType::Access, now, self.access_ttl)?;
        let refresh =
            self.encode(user_id, email, role, TokenType::Refresh, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verify an access token: signature, expiry, issuer/audience, type.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = Self::decode_with(&self.access_decoding, token)?;
        if claims.typ != TokenType::Access {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Verify a refresh token: signature, expiry, issuer/audience, type.
    pub fn verify_refresh(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = Self::decode_with(&self.refresh_decoding, token)?;
        if claims.typ != TokenType::Refresh {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    fn encode(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
        typ: TokenType,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: user_id,
            email: email.to_string(),
            role,
            typ,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let key = match typ {
            TokenType::Access => &self.access_encoding,
            TokenType::Refresh => &self.refresh_encoding,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key).map_err(|_| TokenError::Invalid)
    }

    fn decode_with(key: &DecodingKey, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        let data = decode::<AccessClaims>(token, key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Ok(data.claims)
    }
}
