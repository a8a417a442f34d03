//! # cb-api
//!
//! The web routing and orchestration layer for Clawboard.
//!
//! # Developer Note
//! The router takes its state as an argument so the main binary can
//! mount it under different prefixes (e.g. /api/v1/) and so tests can
//! drive it with `tower::ServiceExt::oneshot` against in-memory stores.

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use cb_core::traits::CommunityStore;
use cb_engine::{CommentService, ReactionService, SessionManager, ShopService};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub community: Arc<dyn CommunityStore>,
    pub reactions: ReactionService,
    pub comments: CommentService,
    pub sessions: SessionManager,
    pub shop: ShopService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/posts/{post_id}", get(handlers::get_post))
        .route("/posts/{post_id}/reactions", post(handlers::apply_reaction))
        .route(
            "/posts/{post_id}/reactions/{user_id}",
            get(handlers::current_reaction),
        )
        .route(
            "/posts/{post_id}/comments",
            post(handlers::add_comment).get(handlers::list_comments),
        )
        .route(
            "/players/{player_id}/minigames/{post_id}",
            post(handlers::open_session),
        )
        .route(
            "/players/{player_id}/minigames/{post_id}/keys",
            post(handlers::session_key),
        )
        .route(
            "/players/{player_id}/minigames/{post_id}/steps",
            post(handlers::session_step),
        )
        .route("/accounts/{account_id}/balance", get(handlers::account_balance))
        .route(
            "/accounts/{account_id}/purchases",
            post(handlers::purchase).get(handlers::owned_items),
        )
        .route("/shop/items", get(handlers::shop_catalog))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
