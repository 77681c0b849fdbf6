pub(super) mod capture;
pub(super) mod events;
pub(super) mod health;
pub(super) mod webhook;

use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::pipeline::TriggerResponse;

impl IntoResponse for TriggerResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status_code, Json(self.body)).into_response();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}
