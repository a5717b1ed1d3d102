use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::chatbot::{MatchKind, find_match};
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::{fetch_page, lower_like};
use crate::entity::chatbot_rule;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::chatbot::*;
use crate::models::shared::{ListQuery, Paginated};
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "chatbot:manage";

const UNAVAILABLE: &str = "The assistant is unavailable right now. Please try again later.";

#[utoipa::path(
    post,
    path = "/api/v1/chatbot/chat",
    tag = "Chatbot",
    operation_id = "chat",
    summary = "Ask the student-affairs assistant",
    description = "Answers from the keyword rule table when a keyword (or a near miss of one) occurs in the message, otherwise from the generative model.",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply", body = ChatResponse),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "The generative model failed", body = ChatErrorResponse),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChatRequest>,
) -> Result<Response, AppError> {
    let message = payload.message.trim();

    let rules = chatbot_rule::Entity::find()
        .order_by_asc(chatbot_rule::Column::CreatedAt)
        .order_by_asc(chatbot_rule::Column::Id)
        .all(&state.db)
        .await?;
    let keywords: Vec<&str> = rules.iter().map(|r| r.keyword.as_str()).collect();

    if let Some(found) = find_match(message, &keywords) {
        let rule = &rules[found.index];
        let source = match found.kind {
            MatchKind::Keyword => ReplySource::Keyword,
            MatchKind::Typo { .. } => ReplySource::Typo,
        };
        tracing::debug!(rule_id = %rule.id, ?source, "Chatbot rule matched");

        let reply = if state.config.chatbot.enrich_matches {
            enrich(&state, message, &rule.response).await
        } else {
            rule.response.clone()
        };
        return Ok(success(reply, source));
    }

    match state
        .generator
        .generate(&state.config.chatbot.persona, message)
        .await
    {
        Ok(reply) => Ok(success(reply, ReplySource::Generative)),
        Err(e) => {
            tracing::error!(error = %e, "Generative chatbot reply failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatErrorResponse {
                    status: "error",
                    message: UNAVAILABLE.into(),
                }),
            )
                .into_response())
        }
    }
}

/// Rephrase a canned answer for the question asked, falling back to the canned text.
async fn enrich(state: &AppState, message: &str, canned: &str) -> String {
    let prompt = format!(
        "A student asked: \"{message}\"\n\nAnswer them using only this information, \
         rephrased naturally and briefly:\n{canned}"
    );
    match state
        .generator
        .generate(&state.config.chatbot.persona, &prompt)
        .await
    {
        Ok(reply) if !reply.trim().is_empty() => reply,
        Ok(_) => canned.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Chatbot enrichment failed, using canned response");
            canned.to_string()
        }
    }
}

fn success(reply: String, source: ReplySource) -> Response {
    Json(ChatResponse {
        status: "success",
        reply,
        source,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/chatbot/rules",
    tag = "Chatbot",
    operation_id = "listChatbotRules",
    summary = "List keyword rules",
    description = "Rules are matched in the order listed. Requires `chatbot:manage` permission.",
    params(ListQuery),
    responses(
        (status = 200, description = "Rules", body = Paginated<RuleResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_rules(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<RuleResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let mut select = chatbot_rule::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(chatbot_rule::Column::Keyword, &term));
    }
    let select = select
        .order_by_asc(chatbot_rule::Column::CreatedAt)
        .order_by_asc(chatbot_rule::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/chatbot/rules",
    tag = "Chatbot",
    operation_id = "createChatbotRule",
    summary = "Add a keyword rule",
    description = "Keywords are stored lowercased. Requires `chatbot:manage` permission.",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = RuleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(keyword = %payload.keyword))]
pub async fn create_rule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = chatbot_rule::ActiveModel {
        id: Set(next_id(&txn, prefix::CHATBOT_RULE).await?),
        keyword: Set(payload.keyword.trim().to_lowercase()),
        response: Set(payload.response.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(RuleResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/chatbot/rules/{id}",
    tag = "Chatbot",
    operation_id = "getChatbotRule",
    summary = "Get a keyword rule",
    description = "Requires `chatbot:manage` permission.",
    params(("id" = String, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule", body = RuleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_rule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RuleResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_rule(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/chatbot/rules/{id}",
    tag = "Chatbot",
    operation_id = "updateChatbotRule",
    summary = "Update a keyword rule",
    description = "PATCH semantics. Requires `chatbot:manage` permission.",
    params(("id" = String, Path, description = "Rule ID")),
    request_body = UpdateRuleRequest,
    responses(
        (status = 200, description = "Rule updated", body = RuleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_rule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateRuleRequest>,
) -> Result<Json<RuleResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_rule(&state.db, &id).await?;
    if payload == UpdateRuleRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: chatbot_rule::ActiveModel = existing.into();
    if let Some(keyword) = payload.keyword {
        active.keyword = Set(keyword.trim().to_lowercase());
    }
    if let Some(response) = payload.response {
        active.response = Set(response.trim().to_string());
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/chatbot/rules/{id}",
    tag = "Chatbot",
    operation_id = "deleteChatbotRule",
    summary = "Delete a keyword rule",
    description = "Requires `chatbot:manage` permission.",
    params(("id" = String, Path, description = "Rule ID")),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_rule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let result = chatbot_rule::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Chatbot rule not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn find_rule<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<chatbot_rule::Model, AppError> {
    chatbot_rule::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Chatbot rule not found".into()))
}
