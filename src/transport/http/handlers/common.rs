use crate::app::DataAccessError;
use crate::domain::Widget;
use crate::transport::http::types::{json_422, ApiResponse};
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::Json;

pub type ErrorResponse = (StatusCode, Json<ApiResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(ApiResponse::failure(message)))
}

pub fn widget_not_found(id: i32) -> ErrorResponse {
    error_response(StatusCode::NOT_FOUND, format!("Widget {} not found.", id))
}

/// Maps a data layer failure onto a response, logging infrastructure failures.
///
/// The client only learns that storage failed; the details stay in the log.
pub fn data_access_failure(operation: &str, err: DataAccessError) -> ErrorResponse {
    if err.is_invalid_argument() {
        tracing::warn!(operation, error = %err, "rejected request");
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }
    tracing::error!(operation, error = %err, "data access failure");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Data access failure")
}

/// Reads an optional widget from a request body.
///
/// Taken as raw bytes rather than through `Json<Widget>` because an empty body (or a literal
/// `null`) is "no widget supplied", a 400 from the store, while `Json` would reject it as 422.
/// Anything else must be a well-formed widget object.
pub fn parse_widget_body(body: &Bytes) -> Result<Option<Widget>, ErrorResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<Widget>>(body)
        .map_err(|e| json_422(e, "{\"name\": ..., \"cost\": ...}"))
}
