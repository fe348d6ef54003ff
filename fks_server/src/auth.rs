//! Bearer token authentication.
//!
//! Tokens are issued elsewhere (the storefront's account service) and signed with a shared HS256 secret. This server
//! only verifies them and turns the claims into a [`CallerIdentity`].
use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use fks_engine::db_types::{Handler, Role};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: i64,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry, in seconds since the epoch
    pub exp: u64,
}

/// Who is calling, as established by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub role: Role,
    pub email: Option<String>,
}

impl CallerIdentity {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// The caller in their capacity as a delivery handler.
    pub fn as_handler(&self) -> Handler {
        Handler { id: self.user_id, email: self.email.clone() }
    }
}

impl From<JwtClaims> for CallerIdentity {
    fn from(claims: JwtClaims) -> Self {
        Self { user_id: claims.sub, role: claims.role, email: claims.email }
    }
}

pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal();
        let key = (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes()));
        Self { key, validation: Validation::new(Algorithm::HS256) }
    }

    pub fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let key = self.key.as_ref().ok_or(AuthError::NotConfigured)?;
        let data = decode::<JwtClaims>(token, key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims.into())
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".to_string()))
}

/// Establishes the caller's identity. The ACL middleware may already have done this, in which case the identity is
/// taken from the request extensions.
pub fn authenticate(req: &HttpRequest) -> Result<CallerIdentity, ServerError> {
    if let Some(identity) = req.extensions().get::<CallerIdentity>() {
        return Ok(identity.clone());
    }
    let verifier = req.app_data::<web::Data<TokenVerifier>>().ok_or_else(|| {
        error!("💻️ No token verifier has been registered with the app");
        AuthError::NotConfigured
    })?;
    let token = bearer_token(req)?;
    let identity = verifier.verify(token).map_err(|e| {
        debug!("💻️ Rejected access token. {e}");
        e
    })?;
    trace!("💻️ Authenticated user {} as {}", identity.user_id, identity.role);
    req.extensions_mut().insert(identity.clone());
    Ok(identity)
}

impl FromRequest for CallerIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
