use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::cursor::{Cursor, Keyed};
use super::page::{Page, PageParams};
use crate::errors::AppError;

/// Column expressions a listing is ordered and sought by.
///
/// Always static SQL; never built from request input.
#[derive(Debug, Clone, Copy)]
pub struct SeekKeys {
    pub timestamp: &'static str,
    pub id: &'static str,
}

/// Appends `AND (ts < $c.ts OR (ts = $c.ts AND id < $c.id))` when a cursor is present.
pub fn push_seek(qb: &mut QueryBuilder<'_, Postgres>, keys: SeekKeys, cursor: Option<Cursor>) {
    let Some(cursor) = cursor else {
        return;
    };
    qb.push(" AND (")
        .push(keys.timestamp)
        .push(" < ")
        .push_bind(cursor.timestamp)
        .push(" OR (")
        .push(keys.timestamp)
        .push(" = ")
        .push_bind(cursor.timestamp)
        .push(" AND ")
        .push(keys.id)
        .push(" < ")
        .push_bind(cursor.id)
        .push("))");
}

/// Appends the total order and the over-fetch limit.
pub fn push_order_and_limit(qb: &mut QueryBuilder<'_, Postgres>, keys: SeekKeys, fetch_limit: i64) {
    qb.push(" ORDER BY ")
        .push(keys.timestamp)
        .push(" DESC, ")
        .push(keys.id)
        .push(" DESC LIMIT ")
        .push_bind(fetch_limit);
}

/// Runs a keyset page query and its total count concurrently.
///
/// `head` writes everything up to (not including) the `WHERE`: CTEs, the
/// select list with aggregate subqueries, and joins. `scope` appends
/// `AND ...` conditions and is applied identically to both queries, so the
/// count never sees the cursor. `count_from` is the `FROM` clause of the
/// count query and must expose every alias `scope` references.
pub async fn fetch_page<T, H, S>(
    pool: &PgPool,
    head: H,
    count_from: &'static str,
    scope: S,
    keys: SeekKeys,
    params: &PageParams,
) -> Result<Page<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Keyed + Send + Unpin,
    H: Fn(&mut QueryBuilder<'_, Postgres>),
    S: Fn(&mut QueryBuilder<'_, Postgres>),
{
    let mut page_qb = QueryBuilder::new("");
    head(&mut page_qb);
    page_qb.push(" WHERE TRUE");
    scope(&mut page_qb);
    push_seek(&mut page_qb, keys, params.cursor());
    push_order_and_limit(&mut page_qb, keys, params.fetch_limit());

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
    count_qb.push(count_from).push(" WHERE TRUE");
    scope(&mut count_qb);

    let (rows, total_count) = tokio::try_join!(
        page_qb.build_query_as::<T>().fetch_all(pool),
        count_qb.build_query_scalar::<i64>().fetch_one(pool),
    )?;

    Ok(Page::from_overfetch(rows, params.limit, total_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    const KEYS: SeekKeys = SeekKeys {
        timestamp: "c.created_at",
        id: "c.id",
    };

    #[test]
    fn test_first_page_has_no_seek_predicate() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM comments c WHERE TRUE");
        push_seek(&mut qb, KEYS, None);
        assert_eq!(qb.sql(), "SELECT * FROM comments c WHERE TRUE");
    }

    #[test]
    fn test_seek_predicate_breaks_ties_on_id() {
        let cursor = Cursor::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Uuid::from_u128(7),
        );
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM comments c WHERE TRUE");
        push_seek(&mut qb, KEYS, Some(cursor));
        assert_eq!(
            qb.sql(),
            "SELECT * FROM comments c WHERE TRUE AND (c.created_at < $1 OR (c.created_at = $2 AND c.id < $3))"
        );
    }

    #[test]
    fn test_order_is_descending_on_both_keys() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM comments c WHERE TRUE");
        push_order_and_limit(&mut qb, KEYS, 11);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM comments c WHERE TRUE ORDER BY c.created_at DESC, c.id DESC LIMIT $1"
        );
    }
}
