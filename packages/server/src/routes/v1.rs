use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(content_routes())
        .merge(scholarship_routes())
        .merge(student_routes())
        .route("/chatbot/chat", post(handlers::chatbot::chat))
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .nest("/admin", admin_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(handlers::news::list_public))
        .route("/news/{id}", get(handlers::news::get_public))
        .route("/news-categories", get(handlers::news::list_categories))
        .route("/announcements", get(handlers::announcement::list_public))
        .route(
            "/announcements/{id}",
            get(handlers::announcement::get_public),
        )
        .route("/achievements", get(handlers::achievement::list_public))
        .route("/downloads", get(handlers::download::list_public))
        .route(
            "/downloads/{id}/file",
            get(handlers::download::download_file),
        )
        .route("/carousel", get(handlers::carousel::list_public))
        .route("/directors", get(handlers::director::list_public))
        .route(
            "/organizations/{kind}",
            get(handlers::organization::get_organization)
                .put(handlers::organization::update_organization),
        )
}

fn scholarship_routes() -> Router<AppState> {
    let submit = Router::new()
        .route("/forms/submit", post(handlers::submission::submit_form))
        .route(
            "/submissions/{id}",
            get(handlers::submission::get_submission)
                .put(handlers::submission::update_submission)
                .delete(handlers::submission::delete_submission),
        )
        .layer(handlers::submission::submission_body_limit());

    Router::new()
        .route("/scholarships", get(handlers::scholarship::list_public))
        .route("/scholarships/{id}", get(handlers::scholarship::get_public))
        .route("/forms/{id}", get(handlers::form::get_public_form))
        .route("/submissions/mine", get(handlers::submission::list_mine))
        .merge(submit)
}

fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/counseling", post(handlers::counseling::create_booking))
        .route("/counseling/mine", get(handlers::counseling::list_mine))
        .route(
            "/counseling/{id}",
            delete(handlers::counseling::cancel_booking),
        )
        .route("/aspirations", post(handlers::aspiration::create_aspiration))
        .route("/aspirations/mine", get(handlers::aspiration::list_mine))
}

fn admin_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/uploads", post(handlers::upload::upload_file))
        .layer(handlers::upload::upload_body_limit());

    Router::new()
        .nest("/scholarships", scholarship_admin_routes())
        .nest("/forms", form_admin_routes())
        .nest("/news", news_admin_routes())
        .nest("/news-categories", category_admin_routes())
        .nest("/announcements", announcement_admin_routes())
        .nest("/achievements", achievement_admin_routes())
        .nest("/downloads", download_admin_routes())
        .nest("/carousel", carousel_admin_routes())
        .nest("/directors", director_admin_routes())
        .nest("/chatbot/rules", chatbot_admin_routes())
        .nest("/counseling", counseling_admin_routes())
        .nest("/aspirations", aspiration_admin_routes())
        .merge(uploads)
}

fn scholarship_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::scholarship::list_scholarships)
                .post(handlers::scholarship::create_scholarship),
        )
        .route(
            "/{id}",
            get(handlers::scholarship::get_scholarship)
                .patch(handlers::scholarship::update_scholarship)
                .delete(handlers::scholarship::delete_scholarship),
        )
}

fn form_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::form::list_forms).post(handlers::form::create_form),
        )
        .route(
            "/{id}",
            get(handlers::form::get_form)
                .patch(handlers::form::update_form)
                .delete(handlers::form::delete_form),
        )
        .route("/{id}/fields", put(handlers::form::replace_fields))
        .route("/{id}/settings", put(handlers::form::update_settings))
        .route("/{id}/submissions", get(handlers::form::list_submissions))
}

fn news_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::news::list_news).post(handlers::news::create_news),
        )
        .route(
            "/{id}",
            get(handlers::news::get_news)
                .patch(handlers::news::update_news)
                .delete(handlers::news::delete_news),
        )
}

fn category_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::news::create_category))
        .route(
            "/{id}",
            patch(handlers::news::update_category)
                .delete(handlers::news::delete_category),
        )
}

fn announcement_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::announcement::list_announcements)
                .post(handlers::announcement::create_announcement),
        )
        .route(
            "/{id}",
            get(handlers::announcement::get_announcement)
                .patch(handlers::announcement::update_announcement)
                .delete(handlers::announcement::delete_announcement),
        )
}

fn achievement_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::achievement::list_achievements)
                .post(handlers::achievement::create_achievement),
        )
        .route(
            "/{id}",
            get(handlers::achievement::get_achievement)
                .patch(handlers::achievement::update_achievement)
                .delete(handlers::achievement::delete_achievement),
        )
}

fn download_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::download::list_downloads).post(handlers::download::create_download),
        )
        .route(
            "/{id}",
            get(handlers::download::get_download)
                .patch(handlers::download::update_download)
                .delete(handlers::download::delete_download),
        )
}

fn carousel_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::carousel::list_slides).post(handlers::carousel::create_slide),
        )
        .route(
            "/{id}",
            get(handlers::carousel::get_slide)
                .patch(handlers::carousel::update_slide)
                .delete(handlers::carousel::delete_slide),
        )
}

fn director_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::director::list_directors).post(handlers::director::create_director),
        )
        .route(
            "/{id}",
            get(handlers::director::get_director)
                .patch(handlers::director::update_director)
                .delete(handlers::director::delete_director),
        )
}

fn chatbot_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::chatbot::list_rules).post(handlers::chatbot::create_rule),
        )
        .route(
            "/{id}",
            get(handlers::chatbot::get_rule)
                .patch(handlers::chatbot::update_rule)
                .delete(handlers::chatbot::delete_rule),
        )
}

fn counseling_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::counseling::list_bookings))
        .route(
            "/{id}",
            patch(handlers::counseling::review_booking),
        )
}

fn aspiration_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::aspiration::list_aspirations))
        .route("/{id}", patch(handlers::aspiration::respond))
}
