use common::sequence::{DEFAULT_WIDTH, format_identifier};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::id_sequence;

/// Issue the next identifier for `prefix`, e.g. `FSUB001`.
///
/// Must run inside the caller's transaction. The upsert and increment take a
/// write lock on the sequence row that is held until commit, so any checks
/// made afterwards in the same transaction are serialized against other
/// writers of the same prefix.
pub async fn next_id<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<String, DbErr> {
    let seed = id_sequence::ActiveModel {
        prefix: Set(prefix.to_string()),
        last_value: Set(0),
    };
    let inserted = id_sequence::Entity::insert(seed)
        .on_conflict(
            OnConflict::column(id_sequence::Column::Prefix)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await;
    match inserted {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    id_sequence::Entity::update_many()
        .col_expr(
            id_sequence::Column::LastValue,
            Expr::col(id_sequence::Column::LastValue).add(1),
        )
        .filter(id_sequence::Column::Prefix.eq(prefix))
        .exec(conn)
        .await?;

    let row = id_sequence::Entity::find_by_id(prefix.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("id_sequence {prefix}")))?;

    Ok(format_identifier(
        prefix,
        row.last_value.max(0) as u64,
        DEFAULT_WIDTH,
    ))
}
