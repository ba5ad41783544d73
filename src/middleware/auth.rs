use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::Error;
use crate::models::profile::{Identity, Role};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn identity(&self) -> Result<Identity, Error> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("token subject is not a user id".into()))?;
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("token carries no role".into()))?
            .parse::<Role>()
            .map_err(|e| Error::Unauthorized(e.to_string()))?;
        Ok(Identity { user_id, role })
    }
}

fn unauthorized(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": reason, "code": "unauthorized"})),
    )
        .into_response()
}

/// Verifies the HS256 bearer token and stores its claims on the request.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => {
            if let Err(e) = data.claims.identity() {
                tracing::debug!(error = %e, "rejecting token with unusable claims");
                return unauthorized("invalid_claims");
            }
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "rejecting invalid token");
            unauthorized("invalid_token")
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| Error::Unauthorized("missing credentials".into()))?
            .identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_resolve_to_identity() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: 0,
            role: Some("client".into()),
        };
        assert_eq!(
            claims.identity().unwrap(),
            Identity {
                user_id,
                role: Role::Client
            }
        );
    }

    #[test]
    fn claims_without_role_are_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: 0,
            role: None,
        };
        assert!(matches!(claims.identity(), Err(Error::Unauthorized(_))));

        let claims = Claims {
            sub: "not-a-uuid".into(),
            exp: 0,
            role: Some("artist".into()),
        };
        assert!(matches!(claims.identity(), Err(Error::Unauthorized(_))));
    }
}
