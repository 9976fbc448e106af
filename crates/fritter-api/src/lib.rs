pub mod auth;
pub mod error;
pub mod freets;
pub mod fritforms;
pub mod likes;
pub mod middleware;
pub mod quotes;
pub mod users;
pub mod validation;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::auth::AppState;

/// Every `/api` route. Each request first passes through
/// [`middleware::load_session`], which attaches the caller's [`middleware::Session`].
pub fn router(state: AppState) -> Router {
    Router::new()
        // Users
        .route(
            "/api/users",
            post(auth::register)
                .patch(users::update_user)
                .delete(users::delete_account),
        )
        .route(
            "/api/users/session",
            get(auth::current_session).post(auth::login).delete(auth::logout),
        )
        .route("/api/users/highlights", get(users::get_highlights))
        .route(
            "/api/users/highlights/{freet_id}",
            post(users::add_highlight).delete(users::remove_highlight),
        )
        .route("/api/users/follow", get(users::get_following))
        .route(
            "/api/users/follow/{username}",
            post(users::follow).delete(users::unfollow),
        )
        // Freets
        .route("/api/freets", get(freets::list_freets).post(freets::create_freet))
        .route(
            "/api/freets/{freet_id}",
            put(freets::update_freet).delete(freets::delete_freet),
        )
        .route("/api/freets/{freet_id}/quotes", get(freets::list_freet_quotes))
        // Quotes
        .route("/api/quotes", get(quotes::list_quotes).post(quotes::create_quote))
        .route(
            "/api/quotes/{quote_id}",
            put(quotes::update_quote).delete(quotes::delete_quote),
        )
        // Likes
        .route(
            "/api/likes/{post_type}/{post_id}",
            post(likes::like_post).delete(likes::unlike_post),
        )
        // FritForms
        .route(
            "/api/fritforms",
            get(fritforms::get_fritform)
                .post(fritforms::create_fritform)
                .put(fritforms::update_fritform)
                .delete(fritforms::delete_fritform),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_session,
        ))
        .with_state(state)
}
