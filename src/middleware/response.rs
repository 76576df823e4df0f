use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// `{ message, data }` envelope returned by mutating endpoints
#[derive(Debug)]
pub struct MessageResponse<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> MessageResponse<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self { message, data }
    }
}

impl<T: Serialize> IntoResponse for MessageResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return crate::error::ApiError::internal_server_error("Failed to format response")
                    .into_response();
            }
        };

        (
            StatusCode::OK,
            Json(json!({
                "message": self.message,
                "data": data_value
            })),
        )
            .into_response()
    }
}

pub type MessageResult<T> = Result<MessageResponse<T>, crate::error::ApiError>;
