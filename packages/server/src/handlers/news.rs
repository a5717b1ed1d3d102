use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use super::{existing_file, fetch_page, lower_like, publish_stamp, remove_replaced, remove_stored};
use crate::entity::{news, news_category};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::*;
use crate::models::shared::{ListQuery, Paginated, trim_opt};
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "content:manage";

#[utoipa::path(
    get,
    path = "/api/v1/news",
    tag = "News",
    operation_id = "listNews",
    summary = "List published news",
    params(ListQuery, NewsFilter),
    responses(
        (status = 200, description = "Published news, newest first", body = Paginated<NewsResponse>),
    ),
)]
#[instrument(skip(state, query, filter))]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<NewsFilter>,
) -> Result<Json<Paginated<NewsResponse>>, AppError> {
    let select = filtered(&query, &filter).filter(news::Column::IsPublished.eq(true));
    let select = select
        .order_by_desc(news::Column::PublishedAt)
        .order_by_desc(news::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/news/{id}",
    tag = "News",
    operation_id = "getNews",
    summary = "Get a published news article",
    params(("id" = String, Path, description = "News ID")),
    responses(
        (status = 200, description = "News article", body = NewsResponse),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewsResponse>, AppError> {
    let model = find_news(&state.db, &id).await?;
    if !model.is_published {
        return Err(AppError::NotFound("News not found".into()));
    }
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/news-categories",
    tag = "News",
    operation_id = "listNewsCategories",
    summary = "List news categories",
    params(ListQuery),
    responses(
        (status = 200, description = "Categories by name", body = Paginated<CategoryResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<CategoryResponse>>, AppError> {
    let mut select = news_category::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(news_category::Column::Name, &term));
    }
    let select = select.order_by_asc(news_category::Column::Name);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/news",
    tag = "News",
    operation_id = "adminListNews",
    summary = "List all news, including drafts",
    description = "Requires `content:manage` permission.",
    params(ListQuery, NewsFilter),
    responses(
        (status = 200, description = "News", body = Paginated<NewsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query, filter))]
pub async fn list_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<NewsFilter>,
) -> Result<Json<Paginated<NewsResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let select = filtered(&query, &filter)
        .order_by_desc(news::Column::CreatedAt)
        .order_by_desc(news::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/news",
    tag = "News",
    operation_id = "createNews",
    summary = "Create a news article",
    description = "`published_at` is stamped when the article is first published. Requires `content:manage` permission.",
    request_body = CreateNewsRequest,
    responses(
        (status = 201, description = "News created", body = NewsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let category_id = match trim_opt(payload.category_id) {
        Some(id) => Some(find_category(&state.db, &id).await?.id),
        None => None,
    };
    let thumbnail_path = match trim_opt(payload.thumbnail_path) {
        Some(raw) => Some(existing_file(&state, &raw).await?.to_string()),
        None => None,
    };

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = news::ActiveModel {
        id: Set(next_id(&txn, prefix::NEWS).await?),
        title: Set(payload.title.trim().to_string()),
        summary: Set(trim_opt(payload.summary)),
        content: Set(payload.content),
        category_id: Set(category_id),
        thumbnail_path: Set(thumbnail_path),
        is_published: Set(payload.is_published),
        published_at: Set(publish_stamp(payload.is_published, None)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(news_id = %model.id, user = %auth_user.username, "News created");
    Ok((StatusCode::CREATED, Json(NewsResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/news/{id}",
    tag = "News",
    operation_id = "adminGetNews",
    summary = "Get a news article",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "News ID")),
    responses(
        (status = 200, description = "News article", body = NewsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewsResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_news(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/news/{id}",
    tag = "News",
    operation_id = "updateNews",
    summary = "Update a news article",
    description = "PATCH semantics. Replacing or clearing the thumbnail deletes the previous file. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "News ID")),
    request_body = UpdateNewsRequest,
    responses(
        (status = 200, description = "News updated", body = NewsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateNewsRequest>,
) -> Result<Json<NewsResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_news(&state.db, &id).await?;
    if payload == UpdateNewsRequest::default() {
        return Ok(Json(existing.into()));
    }

    let old_thumbnail = existing.thumbnail_path.clone();
    let mut active: news::ActiveModel = existing.clone().into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(summary) = payload.summary {
        active.summary = Set(trim_opt(summary));
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(match trim_opt(category_id) {
            Some(id) => Some(find_category(&state.db, &id).await?.id),
            None => None,
        });
    }
    if let Some(thumbnail) = payload.thumbnail_path {
        active.thumbnail_path = Set(match trim_opt(thumbnail) {
            Some(raw) => Some(existing_file(&state, &raw).await?.to_string()),
            None => None,
        });
    }
    if let Some(is_published) = payload.is_published {
        active.is_published = Set(is_published);
        active.published_at = Set(publish_stamp(is_published, existing.published_at));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    remove_replaced(
        &state,
        old_thumbnail.as_deref(),
        updated.thumbnail_path.as_deref(),
    )
    .await;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/news/{id}",
    tag = "News",
    operation_id = "deleteNews",
    summary = "Delete a news article",
    description = "Also deletes its thumbnail. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "News ID")),
    responses(
        (status = 204, description = "News deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_news(&state.db, &id).await?;
    news::Entity::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;
    remove_stored(&state, existing.thumbnail_path.as_deref()).await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/news-categories",
    tag = "News",
    operation_id = "createNewsCategory",
    summary = "Create a news category",
    description = "Requires `content:manage` permission.",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already in use (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    let model = news_category::ActiveModel {
        id: Set(next_id(&txn, prefix::NEWS_CATEGORY).await?),
        name: Set(payload.name.trim().to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(category_conflict)?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/news-categories/{id}",
    tag = "News",
    operation_id = "renameNewsCategory",
    summary = "Rename a news category",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = CategoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let mut active: news_category::ActiveModel = find_category(&state.db, &id).await?.into();
    active.name = Set(payload.name.trim().to_string());
    let model = active.update(&state.db).await.map_err(category_conflict)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/news-categories/{id}",
    tag = "News",
    operation_id = "deleteNewsCategory",
    summary = "Delete a news category",
    description = "News in the category become uncategorized. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    find_category(&txn, &id).await?;
    news::Entity::update_many()
        .col_expr(news::Column::CategoryId, Expr::value(Option::<String>::None))
        .filter(news::Column::CategoryId.eq(&id))
        .exec(&txn)
        .await?;
    news_category::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

fn filtered(query: &ListQuery, filter: &NewsFilter) -> Select<news::Entity> {
    let mut select = news::Entity::find();
    if let Some(category_id) = filter.category_id.as_deref().filter(|c| !c.is_empty()) {
        select = select.filter(news::Column::CategoryId.eq(category_id));
    }
    if let Some(term) = query.search_term() {
        select = select.filter(
            Condition::any()
                .add(lower_like(news::Column::Title, &term))
                .add(lower_like(news::Column::Summary, &term)),
        );
    }
    select
}

fn category_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A category with this name already exists".into())
        }
        _ => e.into(),
    }
}

async fn find_news<C: ConnectionTrait>(conn: &C, id: &str) -> Result<news::Model, AppError> {
    news::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("News not found".into()))
}

async fn find_category<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<news_category::Model, AppError> {
    news_category::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("News category not found".into()))
}
