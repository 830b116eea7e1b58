// --- File: crates/services/classbook_backend/src/lib.rs ---
use axum::{routing::get, Router};
use classbook_booking::handlers::BookingState;
use classbook_booking::routes as booking_routes;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod service_factory;

/// The full application router: booking routes under `/api`.
pub fn app(state: Arc<BookingState>) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Classbook API!" }))
        .merge(booking_routes::routes(state));

    #[allow(unused_mut)] // mutated with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use classbook_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Classbook API",
                version = "0.1.0",
                description = "Class session booking API",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
