//! Values bound to dynamically built queries.

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    BigInt(i64),
}

/// Bind params in order onto a `sqlx::query_as`.
pub fn bind_all_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for p in params {
        query = match p {
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::BigInt(n) => query.bind(*n),
        };
    }
    query
}
