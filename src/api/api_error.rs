use crate::error::Error;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) struct APIError(anyhow::Error);

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let any_err = self.0;
        let status = match any_err.downcast_ref::<JsonRejection>() {
            Some(JsonRejection::JsonDataError(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(JsonRejection::JsonSyntaxError(_)) => StatusCode::BAD_REQUEST,
            Some(JsonRejection::MissingJsonContentType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
            None => match any_err.downcast_ref::<Error>() {
                Some(Error::EmptyTargets { .. }) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        if status.is_server_error() {
            tracing::error!("request failed: {any_err:#}");
        } else {
            tracing::debug!("request rejected: {any_err:#}");
        }
        let body = Json(json!({
            "error": format!("{any_err}"),
        }));
        (status, body).into_response()
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
