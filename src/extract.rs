use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// JSON body extractor that rejects with a 400 naming the offending field,
/// e.g. ``invalid request body at `permission_keys[1]`: invalid type``.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);
        if !is_json {
            return Err(AppError::bad_request("expected `Content-Type: application/json`"));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        parse_body(&bytes).map(ApiJson)
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|err| {
        AppError::bad_request(format!("invalid request body at `{}`: {}", err.path(), err.inner()))
    })?;
    de.end()
        .map_err(|err| AppError::bad_request(format!("invalid request body: {}", err)))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role_permission::AssignPermissionsRequest;

    #[test]
    fn reports_path_of_bad_field() {
        let err = parse_body::<AssignPermissionsRequest>(br#"{"permission_keys": ["a_view", 3]}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("permission_keys[1]"), "got: {}", message);
    }

    #[test]
    fn replace_all_defaults_to_false() {
        let req = parse_body::<AssignPermissionsRequest>(br#"{"permission_keys": []}"#).expect("parse");
        assert!(!req.replace_all);
        assert!(req.permission_keys.is_empty());
    }
}
