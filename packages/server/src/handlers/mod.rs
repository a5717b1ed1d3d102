pub mod achievement;
pub mod announcement;
pub mod aspiration;
pub mod auth;
pub mod carousel;
pub mod chatbot;
pub mod counseling;
pub mod dashboard;
pub mod director;
pub mod download;
pub mod form;
pub mod news;
pub mod organization;
pub mod scholarship;
pub mod submission;
pub mod upload;

use chrono::{DateTime, Utc};
use common::storage::StoredPath;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, SimpleExpr};
use sea_orm::*;

use crate::models::shared::Pagination;
use crate::state::AppState;

/// Run a paginated select. `page` is 1-based.
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    (page, per_page): (u64, u64),
) -> Result<(Vec<E::Model>, Pagination), DbErr>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;
    Ok((items, Pagination::new(page, per_page, total)))
}

/// Case-insensitive `LIKE` on a column. `pattern` must already be escaped and lowercased.
pub(crate) fn lower_like<C: ColumnTrait>(col: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Parse a client-supplied stored path, rejecting anything outside the storage layout.
pub(crate) fn parse_stored(raw: &str) -> Result<StoredPath, crate::error::AppError> {
    Ok(StoredPath::parse(raw.trim())?)
}

/// Parse a client-supplied stored path and require the file to exist.
pub(crate) async fn existing_file(
    state: &AppState,
    raw: &str,
) -> Result<StoredPath, crate::error::AppError> {
    let path = parse_stored(raw)?;
    if !state.files.exists(&path).await? {
        return Err(crate::error::AppError::Validation(format!(
            "File '{path}' does not exist; upload it first"
        )));
    }
    Ok(path)
}

/// Best-effort removal of a file referenced by a deleted or updated row.
pub(crate) async fn remove_stored(state: &AppState, raw: Option<&str>) {
    let Some(path) = raw.and_then(|r| StoredPath::parse(r).ok()) else {
        return;
    };
    if let Err(e) = state.files.delete(&path).await {
        tracing::warn!(path = %path, error = %e, "Failed to delete stored file");
    }
}

/// Remove `old` if an update replaced or cleared it.
pub(crate) async fn remove_replaced(state: &AppState, old: Option<&str>, new: Option<&str>) {
    if old.is_some() && old != new {
        remove_stored(state, old).await;
    }
}

/// `published_at` after a publish-state change: stamped on first publish, kept afterwards.
pub(crate) fn publish_stamp(
    is_published: bool,
    current: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (is_published, current) {
        (true, None) => Some(Utc::now()),
        (_, current) => current,
    }
}
