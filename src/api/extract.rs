use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;

/// JSON body that may be left out entirely. An empty body yields
/// `T::default()`; any other body must deserialize as `T` or the request is
/// rejected with 400.
#[derive(Debug)]
pub(crate) struct OptionalJson<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&body)
            .map(Self)
            .map_err(|err| ApiError::BadRequest(format!("Invalid request body: {err}")))
    }
}
