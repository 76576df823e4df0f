use std::convert::Infallible;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::middleware::{Principal, UploadedAsset};

/// Everything a command needs to know about the caller, passed explicitly
/// into each [`crate::services::CatService`] call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub upload: Option<UploadedAsset>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_principal(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            upload: None,
        }
    }

    pub fn with_upload(mut self, upload: UploadedAsset) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn principal_id(&self) -> Option<Uuid> {
        self.principal.as_ref().map(|p| p.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            principal: parts.extensions.get::<Principal>().cloned(),
            upload: parts.extensions.get::<UploadedAsset>().cloned(),
        })
    }
}
