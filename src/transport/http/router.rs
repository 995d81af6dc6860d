use crate::domain::Widget;
use crate::transport::http::handlers::widgets::WIDGET_BASE_PATH;
use crate::transport::http::handlers::{health, widgets};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        widgets::list_widgets_handler,
        widgets::get_widget_handler,
        widgets::create_widget_handler,
        widgets::update_widget_handler,
        widgets::delete_widget_handler
    ),
    components(schemas(ApiResponse, Widget))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            WIDGET_BASE_PATH,
            get(widgets::list_widgets_handler).post(widgets::create_widget_handler),
        )
        .route(
            &format!("{}/:id", WIDGET_BASE_PATH),
            get(widgets::get_widget_handler)
                .put(widgets::update_widget_handler)
                .delete(widgets::delete_widget_handler),
        )
        .with_state(app_state)
}
