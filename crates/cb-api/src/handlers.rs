//! # cb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! engine services. Bodies and responses are plain JSON; identity
//! comes from the request (session/token issuance is out of scope).

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cb_core::error::CoreError;
use cb_core::models::{Account, Comment, Post, PostKind};
use cb_engine::sessions::KeyInput;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .community
        .get_post(post_id)
        .await?
        .ok_or(CoreError::PostNotFound(post_id))?;
    Ok(Json(post))
}

#[derive(Deserialize)]
pub struct ReactBody {
    pub user_id: Uuid,
    pub kind: String,
}

pub async fn apply_reaction(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(body): Json<ReactBody>,
) -> Result<Response, ApiError> {
    let receipt = state
        .reactions
        .apply(body.user_id, post_id, &body.kind)
        .await?;
    Ok(Json(receipt).into_response())
}

pub async fn current_reaction(
    State(state): State<AppState>,
    Path((post_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let record = state.reactions.current(user_id, post_id).await?;
    Ok(Json(record).into_response())
}

#[derive(Deserialize)]
pub struct CommentBody {
    pub author_id: Uuid,
    pub post_kind: PostKind,
    pub text: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .comments
        .add(post_id, body.post_kind, body.author_id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Deserialize)]
pub struct CommentQuery {
    pub kind: PostKind,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.comments.list(post_id, query.kind).await?))
}

pub async fn open_session(
    State(state): State<AppState>,
    Path((player_id, post_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let view = state.sessions.open(player_id, post_id).await?;
    Ok(Json(view).into_response())
}

#[derive(Deserialize)]
pub struct KeyBody {
    /// "enter", "backspace", or a single letter.
    pub key: String,
}

pub async fn session_key(
    State(state): State<AppState>,
    Path((player_id, post_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<KeyBody>,
) -> Result<Response, ApiError> {
    let input = parse_key(&body.key)?;
    let update = state.sessions.key(player_id, post_id, input).await?;
    Ok(session_response(update))
}

#[derive(Deserialize)]
pub struct StepBody {
    pub dt_ms: f32,
    #[serde(default)]
    pub tap: bool,
}

pub async fn session_step(
    State(state): State<AppState>,
    Path((player_id, post_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<StepBody>,
) -> Result<Response, ApiError> {
    let update = state
        .sessions
        .step(player_id, post_id, body.dt_ms, body.tap)
        .await?;
    Ok(session_response(update))
}

pub async fn account_balance(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Account { id, claw_marks, .. } = state.shop.account(account_id).await?;
    Ok(Json(json!({ "account_id": id, "claw_marks": claw_marks })))
}

#[derive(Deserialize)]
pub struct CatalogQuery {
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub exclude_owned: bool,
}

pub async fn shop_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, ApiError> {
    let items = match (query.account_id, query.exclude_owned) {
        (Some(account_id), exclude_owned) => {
            state.shop.catalog(account_id, exclude_owned).await?
        }
        (None, _) => state.shop.catalog(Uuid::nil(), false).await?,
    };
    Ok(Json(items).into_response())
}

pub async fn owned_items(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(Json(state.shop.owned(account_id).await?).into_response())
}

#[derive(Deserialize)]
pub struct PurchaseBody {
    pub item_id: Uuid,
}

pub async fn purchase(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(body): Json<PurchaseBody>,
) -> Result<Response, ApiError> {
    let receipt = state.shop.purchase(account_id, body.item_id).await?;
    Ok(Json(receipt).into_response())
}

fn parse_key(raw: &str) -> Result<KeyInput, ApiError> {
    match raw {
        "enter" => Ok(KeyInput::Enter),
        "backspace" => Ok(KeyInput::Backspace),
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) if ch.is_ascii_alphabetic() => Ok(KeyInput::Letter(ch)),
                _ => Err(CoreError::Validation(format!("unrecognized key: {raw:?}")).into()),
            }
        }
    }
}

/// A late input on a finished game comes back as `None`; answer with
/// 204 so retrying clients settle quietly.
fn session_response(update: Option<cb_engine::sessions::SessionUpdate>) -> Response {
    match update {
        Some(update) => Json(update).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parsing_accepts_letters_and_controls() {
        assert_eq!(parse_key("enter").unwrap(), KeyInput::Enter);
        assert_eq!(parse_key("backspace").unwrap(), KeyInput::Backspace);
        assert_eq!(parse_key("q").unwrap(), KeyInput::Letter('q'));
        assert!(parse_key("qq").is_err());
        assert!(parse_key("3").is_err());
        assert!(parse_key("").is_err());
    }
}
