pub mod auth;
pub mod health;
pub mod messages;
pub mod portfolio;
pub mod profiles;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router(upload_body_limit: usize) -> Router<Arc<AppState>> {
    // Multipart routes get a larger body allowance than JSON ones
    let uploads = Router::new()
        .route("/profiles/me/images/:kind", post(profiles::upload_profile_image))
        .route("/profiles/me/portfolio", post(portfolio::upload_portfolio_images))
        .layer(DefaultBodyLimit::max(upload_body_limit));

    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signup/validate", post(auth::validate_signup_form))
        // Directory
        .route("/profiles/search", get(profiles::search_profiles))
        .route("/profiles/suggestions", get(profiles::get_suggestions))
        .route(
            "/profiles/by-username/:username",
            get(profiles::get_profile_by_username),
        )
        // Own profile (static segments take precedence over /profiles/:id)
        .route(
            "/profiles/me",
            get(profiles::get_my_profile).patch(profiles::update_my_profile),
        )
        .route(
            "/profiles/me/portfolio/order",
            put(portfolio::reorder_portfolio),
        )
        .route(
            "/profiles/me/portfolio/:image_id",
            delete(portfolio::delete_portfolio_image),
        )
        .route("/profiles/:id", get(profiles::get_profile))
        .merge(uploads)
        // Messages
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/api/messages/:id/read", patch(messages::mark_message_read))
        .route("/api/messages/:id/reply", post(messages::reply_to_message))
}
