pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::handlers::*;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Affairs Portal API",
        version = "1.0.0",
        description = "API for the university student-affairs portal"
    ),
    paths(
        auth::login,
        auth::me,
        scholarship::list_public,
        scholarship::get_public,
        scholarship::list_scholarships,
        scholarship::create_scholarship,
        scholarship::get_scholarship,
        scholarship::update_scholarship,
        scholarship::delete_scholarship,
        form::get_public_form,
        form::list_forms,
        form::create_form,
        form::get_form,
        form::update_form,
        form::delete_form,
        form::replace_fields,
        form::update_settings,
        form::list_submissions,
        submission::submit_form,
        submission::list_mine,
        submission::get_submission,
        submission::update_submission,
        submission::delete_submission,
        news::list_public,
        news::get_public,
        news::list_categories,
        news::list_news,
        news::create_news,
        news::get_news,
        news::update_news,
        news::delete_news,
        news::create_category,
        news::update_category,
        news::delete_category,
        announcement::list_public,
        announcement::get_public,
        announcement::list_announcements,
        announcement::create_announcement,
        announcement::get_announcement,
        announcement::update_announcement,
        announcement::delete_announcement,
        achievement::list_public,
        achievement::list_achievements,
        achievement::create_achievement,
        achievement::get_achievement,
        achievement::update_achievement,
        achievement::delete_achievement,
        download::list_public,
        download::download_file,
        download::list_downloads,
        download::create_download,
        download::get_download,
        download::update_download,
        download::delete_download,
        carousel::list_public,
        carousel::list_slides,
        carousel::create_slide,
        carousel::get_slide,
        carousel::update_slide,
        carousel::delete_slide,
        director::list_public,
        director::list_directors,
        director::create_director,
        director::get_director,
        director::update_director,
        director::delete_director,
        organization::get_organization,
        organization::update_organization,
        upload::upload_file,
        chatbot::chat,
        chatbot::list_rules,
        chatbot::create_rule,
        chatbot::get_rule,
        chatbot::update_rule,
        chatbot::delete_rule,
        counseling::create_booking,
        counseling::list_mine,
        counseling::cancel_booking,
        counseling::list_bookings,
        counseling::review_booking,
        aspiration::create_aspiration,
        aspiration::list_mine,
        aspiration::list_aspirations,
        aspiration::respond,
        dashboard::get_dashboard,
    ),
    tags(
        (name = "Auth", description = "Login through the campus identity service"),
        (name = "Scholarships", description = "Scholarship programs"),
        (name = "Forms", description = "Scholarship application forms, fields and settings"),
        (name = "Submissions", description = "Form submissions"),
        (name = "News", description = "News articles and categories"),
        (name = "Announcements", description = "Announcements"),
        (name = "Achievements", description = "Student achievements"),
        (name = "Downloads", description = "Downloadable documents"),
        (name = "Carousel", description = "Home page carousel"),
        (name = "Directors", description = "Student-affairs leadership"),
        (name = "Organizations", description = "BEM and MPM profiles"),
        (name = "Uploads", description = "File uploads for content"),
        (name = "Chatbot", description = "Assistant and its keyword rules"),
        (name = "Counseling", description = "Counseling bookings"),
        (name = "Aspirations", description = "Student aspirations"),
        (name = "Dashboard", description = "Summary counts"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    let cors = cors_layer(&state.config.server.cors);
    let storage = ServeDir::new(&state.config.storage.root);

    router
        .with_state(state)
        .nest_service("/storage", storage)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// An empty origin list allows no cross-origin callers.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}
