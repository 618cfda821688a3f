use crate::api::api_error::APIError;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Media type of the external-dns webhook protocol.
pub const MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// A JSON response body sent with the webhook [`MEDIA_TYPE`].
pub(super) struct WebhookJson<T>(pub T);

impl<T: Serialize> IntoResponse for WebhookJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => {
                let content_type = HeaderValue::from_static(MEDIA_TYPE);
                ([(CONTENT_TYPE, content_type)], body).into_response()
            }
            Err(err) => APIError::from(err).into_response(),
        }
    }
}
