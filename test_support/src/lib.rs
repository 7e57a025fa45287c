//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: In-memory store, roster schema, and seed helpers for all crates

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Roster schema the repositories expect to already exist
pub const ROSTER_SCHEMA: &str = include_str!("fixtures/schema.sql");

/// Fresh in-memory database with the roster schema applied
///
/// Uses a single connection so every query sees the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should open");

    create_schema(&pool).await;
    pool
}

/// Apply the roster schema to a pool
pub async fn create_schema(pool: &SqlitePool) {
    sqlx::raw_sql(ROSTER_SCHEMA)
        .execute(pool)
        .await
        .expect("roster schema should apply");
}

/// Insert an activist with only a name and return its id
pub async fn seed_activist(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO activists (name) VALUES (?1)")
        .bind(name)
        .execute(pool)
        .await
        .expect("activist insert should succeed")
        .last_insert_rowid()
}

/// Insert an event on a `YYYY-MM-DD` date and return its id
pub async fn seed_event(pool: &SqlitePool, date: &str) -> i64 {
    sqlx::query("INSERT INTO events (date) VALUES (?1)")
        .bind(date)
        .execute(pool)
        .await
        .expect("event insert should succeed")
        .last_insert_rowid()
}

/// Record that an activist attended an event
pub async fn attend(pool: &SqlitePool, activist_id: i64, event_id: i64) {
    sqlx::query("INSERT INTO event_attendance (activist_id, event_id) VALUES (?1, ?2)")
        .bind(activist_id)
        .bind(event_id)
        .execute(pool)
        .await
        .expect("attendance insert should succeed");
}

/// Count rows in the activists table
pub async fn activist_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM activists")
        .fetch_one(pool)
        .await
        .expect("count should succeed")
}

