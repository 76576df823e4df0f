use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::models::Role;

/// Authenticated caller extracted from a JWT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// Attaches a [`Principal`] to the request when a bearer token is present.
///
/// Requests without an Authorization header pass through anonymously; a
/// header that is present but malformed, or a token that fails validation,
/// is rejected with 401.
pub async fn principal_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    if let Some(token) = extract_bearer_token(request.headers()).map_err(ApiError::unauthorized)? {
        let claims = validate_jwt(&token).map_err(|e| {
            tracing::warn!("Rejected bearer token: {}", e);
            ApiError::unauthorized("Not authorized")
        })?;

        let principal = Principal::from(claims);
        tracing::debug!("Authenticated principal {} ({})", principal.id, principal.role);
        request.extensions_mut().insert(principal);
    }

    Ok(next.run(request).await)
}

/// Extract the JWT from the Authorization header, if one was sent
fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers), Ok(Some("abc.def.ghi".to_string())));
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_err());
    }
}
