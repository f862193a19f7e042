//! The execution collaborator: whatever actually runs compiled SQL.

use crate::error::{SqlifyError, SqlifyResult};
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A connection that can execute SQL with positional parameters.
///
/// This is the only suspension point of an [`Executor`](crate::Executor):
/// compiling and binding never perform I/O. Implementations own any
/// connection-level serialization; errors are passed through to the caller
/// unchanged.
///
/// Implemented for `tokio_postgres::Client`, `tokio_postgres::Transaction`
/// and (feature `pool`) `deadpool_postgres::Client` / `deadpool_postgres::Pool`.
/// Test doubles only need to implement [`Connection::query`].
pub trait Connection: Send + Sync {
    /// Row type returned by the connection. Never inspected by sqlify.
    type Row: Send;

    /// Execute `sql` with `params[i]` bound to `$i+1` and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = SqlifyResult<Vec<Self::Row>>> + Send;
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl Connection for tokio_postgres::Client {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[Value]) -> SqlifyResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, &param_refs(params))
            .await
            .map_err(SqlifyError::from)
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[Value]) -> SqlifyResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, &param_refs(params))
            .await
            .map_err(SqlifyError::from)
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[Value]) -> SqlifyResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, &param_refs(params))
            .await
            .map_err(SqlifyError::from)
    }
}

/// Checks out a pooled connection for every query.
#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Pool {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[Value]) -> SqlifyResult<Vec<Row>> {
        let client = self.get().await?;
        Connection::query(&client, sql, params).await
    }
}
