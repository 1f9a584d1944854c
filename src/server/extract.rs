//! Request extractors

use crate::auth::{check_api_key, API_KEY_HEADER};
use crate::error::Error;
use crate::server::error::ApiError;
use crate::server::AppState;
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;

/// Proof that the caller presented a valid `x-api-key`
///
/// Put it before any body extractor so unauthenticated requests are turned
/// away without reading the body.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

#[async_trait]
impl FromRequestParts<AppState> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        check_api_key(&state.config, presented)?;
        Ok(Self)
    }
}

/// JSON body whose rejections come back as `validation_failed`
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::ValidationFailed(rejection.body_text()).into()),
        }
    }
}
