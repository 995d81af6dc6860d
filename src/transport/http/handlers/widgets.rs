use crate::transport::http::handlers::common::{
    data_access_failure, error_response, parse_widget_body, widget_not_found,
};
use crate::transport::http::types::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

pub const WIDGET_BASE_PATH: &str = "/api/v1/Widget";

#[utoipa::path(
    get,
    path = "/api/v1/Widget",
    responses(
        (status = 200, description = "All widgets (possibly empty)", body = [crate::domain::Widget]),
        (status = 500, description = "Data access failure", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn list_widgets_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_widgets().await {
        Ok(widgets) => (StatusCode::OK, Json(widgets)).into_response(),
        Err(e) => data_access_failure("list", e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/Widget/{id}",
    params(
        ("id" = i32, Path, description = "Widget id")
    ),
    responses(
        (status = 200, description = "Widget found", body = crate::domain::Widget),
        (status = 404, description = "No widget with this id", body = crate::transport::http::types::ApiResponse),
        (status = 500, description = "Data access failure", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn get_widget_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.store.get_widget_by_id(id).await {
        Ok(Some(widget)) => (StatusCode::OK, Json(widget)).into_response(),
        Ok(None) => widget_not_found(id).into_response(),
        Err(e) => data_access_failure("get", e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/Widget",
    request_body = crate::domain::Widget,
    responses(
        (status = 201, description = "Widget created; body carries the assigned id", body = crate::domain::Widget),
        (status = 400, description = "No widget supplied", body = crate::transport::http::types::ApiResponse),
        (status = 409, description = "The insert affected no rows", body = crate::transport::http::types::ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = crate::transport::http::types::ApiResponse),
        (status = 500, description = "Data access failure", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn create_widget_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let widget = match parse_widget_body(&body) {
        Ok(w) => w,
        Err(resp) => return resp.into_response(),
    };

    match state.store.insert_widget(widget.as_ref()).await {
        Ok(Some(created)) => {
            tracing::info!(id = created.id, "widget created");
            let location = format!("{}/{}", WIDGET_BASE_PATH, created.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(created),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::CONFLICT, "Widget was not inserted.").into_response(),
        Err(e) => data_access_failure("insert", e).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/Widget/{id}",
    params(
        ("id" = i32, Path, description = "Widget id")
    ),
    request_body = crate::domain::Widget,
    responses(
        (status = 200, description = "Widget replaced", body = crate::domain::Widget),
        (status = 400, description = "No widget supplied", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "No widget with this id", body = crate::transport::http::types::ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = crate::transport::http::types::ApiResponse),
        (status = 500, description = "Data access failure", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn update_widget_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Bytes,
) -> impl IntoResponse {
    let widget = match parse_widget_body(&body) {
        Ok(w) => w,
        Err(resp) => return resp.into_response(),
    };

    match state.store.update_widget(id, widget.as_ref()).await {
        Ok(0) => widget_not_found(id).into_response(),
        Ok(_) => {
            // A body id, if any, never overrides the path.
            let updated = widget.map(|w| w.with_id(id)).unwrap_or_default();
            (StatusCode::OK, Json(updated)).into_response()
        }
        Err(e) => data_access_failure("update", e).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/Widget/{id}",
    params(
        ("id" = i32, Path, description = "Widget id")
    ),
    responses(
        (status = 204, description = "Widget removed"),
        (status = 404, description = "No widget with this id", body = crate::transport::http::types::ApiResponse),
        (status = 500, description = "Data access failure", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn delete_widget_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.store.delete_widget(id).await {
        Ok(0) => widget_not_found(id).into_response(),
        Ok(_) => {
            tracing::info!(id, "widget deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => data_access_failure("delete", e).into_response(),
    }
}
