//! Relational store for the design catalog: typed objects, typed relations,
//! parent/child hierarchies, the three type catalogs, users and chat sessions.
//!
//! Sqlite behind a bb8 pool of async-wrapped connections; migrations are
//! embedded and run once at startup. JSON-valued columns are serialized Text.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{ObjectDesignError, Result};

pub(crate) mod schema;

mod catalogs;
mod chat;
mod hierarchies;
mod objects;
mod relations;
mod users;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub(crate) type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
type SqlitePool = Pool<SqliteAsyncConn>;
pub(crate) type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

#[derive(QueryableByName)]
pub(crate) struct RowId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub(crate) id: i64,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(database_path: &str) -> Result<Self> {
        ensure_parent_dir(database_path)?;
        run_migrations(database_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(database_path);
        let pool: SqlitePool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;

        Ok(Self { pool })
    }

    pub(crate) async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        self.pool
            .get()
            .await
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))
    }
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
    }
    Ok(())
}

async fn run_migrations(database_path: &str) -> Result<()> {
    let database_path = database_path.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_path)
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        Ok::<_, ObjectDesignError>(())
    })
    .await
    .map_err(|e| ObjectDesignError::Runtime(e.to_string()))??;
    Ok(())
}

pub(crate) fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

pub(crate) fn format_ts(ts: i64) -> String {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.to_string())
}

pub(crate) fn to_json_text(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ObjectDesignError::Serialization(e.to_string()))
}

pub(crate) fn from_json_text(text: &str, fallback: serde_json::Value) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or(fallback)
}
