//! PostgreSQL backend.

mod directory;
mod grants;
mod resources;
mod shares;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;

use crate::store::StoreHealth;

/// Store backed by PostgreSQL. Uniqueness and atomicity are enforced by the
/// schema in `migrations/` and by explicit transactions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error("Store ping failed"))
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL store closed");
    }
}

/// Map a sqlx error. Unique violations become `Conflict` and foreign key
/// violations `NotFound`, matching what the memory backend reports.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let code = e
            .as_database_error()
            .and_then(|d| d.code())
            .map(|c| c.into_owned());
        match kind_for_sqlstate(code.as_deref()) {
            ErrorKind::Conflict => {
                AppError::with_source(ErrorKind::Conflict, format!("{context}: already exists"), e)
            }
            ErrorKind::NotFound => AppError::with_source(
                ErrorKind::NotFound,
                format!("{context}: referenced record not found"),
                e,
            ),
            kind => AppError::with_source(kind, context, e),
        }
    }
}

fn kind_for_sqlstate(code: Option<&str>) -> ErrorKind {
    match code {
        Some("23505") => ErrorKind::Conflict,
        Some("23503") => ErrorKind::NotFound,
        _ => ErrorKind::Database,
    }
}
