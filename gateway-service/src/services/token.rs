//! Signed bearer tokens for the gateway.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different
//! secrets, so one kind can never be verified as the other. Expiry is
//! checked here rather than by `jsonwebtoken` so it can be driven by an
//! explicit clock, and it is strict: a token is valid only while
//! `now < exp`.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn other(&self) -> TokenKind {
        match self {
            TokenKind::Access => TokenKind::Refresh,
            TokenKind::Refresh => TokenKind::Access,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid")]
    Malformed,
    #[error("token is of the wrong kind")]
    WrongKind,
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("identity has no {0}")]
    MissingClaim(&'static str),
}

/// Who a token is issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub role: String,
    pub tenant_id: String,
    pub display_name: Option<String>,
    pub contact: Option<String>,
}

impl Identity {
    /// First required field that is blank, if any.
    pub fn missing_claim(&self) -> Option<&'static str> {
        [
            ("subject_id", &self.subject_id),
            ("role", &self.role),
            ("tenant_id", &self.tenant_id),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Verified token payload. Field names on the wire are stable; downstream
/// consumers read `id`, `role` and `company_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "id")]
    pub subject_id: String,
    pub role: String,
    #[serde(rename = "company_id")]
    pub tenant_id: String,
    #[serde(rename = "first_name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "phone_number", default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.subject_id.clone(),
            role: self.role.clone(),
            tenant_id: self.tenant_id.clone(),
            display_name: self.display_name.clone(),
            contact: self.contact.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub kind: TokenKind,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl IssuedToken {
    pub fn expires_in(&self) -> i64 {
        self.expires_at - self.issued_at
    }
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues and verifies access and refresh tokens. Owns both secrets.
#[derive(Clone)]
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(
        access_secret: &Secret<String>,
        refresh_secret: &Secret<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        let access = access_secret.expose_secret();
        let refresh = refresh_secret.expose_secret();

        if access.is_empty() || refresh.is_empty() {
            return Err(TokenError::Signing("secret must not be empty".to_string()));
        }
        if access == refresh {
            return Err(TokenError::Signing(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        Ok(Self {
            access: SigningKeys::from_secret(access.as_bytes()),
            refresh: SigningKeys::from_secret(refresh.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self, TokenError> {
        let codec = Self::new(
            &config.access_secret,
            &config.refresh_secret,
            Duration::hours(config.access_token_expiry_hours),
            Duration::hours(config.refresh_token_expiry_hours),
        )?;
        tracing::info!(
            access_ttl_hours = config.access_token_expiry_hours,
            refresh_ttl_hours = config.refresh_token_expiry_hours,
            "Token codec initialized with HS256 keys"
        );
        Ok(codec)
    }

    pub fn issue_access_token(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, TokenKind::Access, Utc::now().timestamp())
    }

    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, TokenKind::Refresh, Utc::now().timestamp())
    }

    /// Issue a token as if the clock read `now` (unix seconds).
    pub fn issue_at(
        &self,
        identity: &Identity,
        kind: TokenKind,
        now: i64,
    ) -> Result<IssuedToken, TokenError> {
        if let Some(claim) = identity.missing_claim() {
            return Err(TokenError::MissingClaim(claim));
        }

        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            subject_id: identity.subject_id.clone(),
            role: identity.role.clone(),
            tenant_id: identity.tenant_id.clone(),
            display_name: identity.display_name.clone().filter(|s| !s.is_empty()),
            contact: identity.contact.clone().filter(|s| !s.is_empty()),
            iat: now,
            exp: now + ttl.num_seconds(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            kind,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, expected, Utc::now().timestamp())
    }

    /// Verify a token as if the clock read `now` (unix seconds).
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<Claims, TokenError> {
        let claims = match self.decode_with(token, expected) {
            Ok(claims) => claims,
            Err(ErrorKind::InvalidSignature) => {
                // Well-formed but signed with the other secret?
                return match self.decode_with(token, expected.other()) {
                    Ok(_) => Err(TokenError::WrongKind),
                    Err(_) => Err(TokenError::Malformed),
                };
            }
            Err(_) => return Err(TokenError::Malformed),
        };

        if let Some(claim) = claims.identity().missing_claim() {
            tracing::warn!(claim, "Token carries a blank required claim");
            return Err(TokenError::Malformed);
        }

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn decode_with(&self, token: &str, kind: TokenKind) -> Result<Claims, ErrorKind> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| e.into_kind())
    }
}
