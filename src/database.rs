use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use tokio::sync::RwLock;

use crate::config::DatabaseConfig;

pub mod auth;
pub mod schedule;
pub mod students;
pub mod teachers;
pub mod user;

pub static POSTGRES: RwLock<Option<Pool<Postgres>>> = RwLock::const_new(None);

/// Opens a transaction on the shared pool and runs `$body` with it bound to `$transaction`.
///
/// The body is expected to `return`; falling out of the macro means no pool was available.
#[macro_export]
macro_rules! postgres_lock {
    ($transaction:ident, $body:block) => {
        let postgres_pool = $crate::database::POSTGRES.read().await;
        if let Some(transaction_future) = postgres_pool.as_ref().map(|f| f.begin()) {
            #[allow(unused_mut)]
            let mut $transaction = match transaction_future.await {
                Ok(t) => t,
                Err(e) => return Err(format!("Could not begin database transaction: {e}")),
            };
            $body
        }
    };
}

pub async fn init_database(config: &DatabaseConfig) -> Result<(), String> {
    let Some(url) = config.url.as_deref() else {
        return Err("No database configured (set DATABASE_URL or PSQL_NAME/PSQL_PASS)".into());
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            return Err(format!("{e}"));
        }
    };

    let mut transaction = match pool.begin().await {
        Ok(t) => t,
        Err(e) => return Err(format!("Could not begin schema transaction: {e}")),
    };

    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            login TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'teacher', 'student'))
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Failed to create user table: {e}"));
    };

    // Password hashes
    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_auth (
            user_id INTEGER PRIMARY KEY REFERENCES users (id) ON DELETE CASCADE,
            hash BYTEA NOT NULL
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create auth table: {e}"));
    }

    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_session(
            session_hash BYTEA PRIMARY KEY,
            user_id INTEGER REFERENCES users (id) ON DELETE CASCADE,
            expiration TIMESTAMPTZ NOT NULL
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create session table: {e}"));
    }

    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS students(
            user_id INTEGER PRIMARY KEY REFERENCES users (id) ON DELETE CASCADE,
            class_name TEXT NOT NULL DEFAULT '',
            parent_contact TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create students table: {e}"));
    }

    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS teachers(
            id INTEGER PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            full_name TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create teachers table: {e}"));
    }

    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS schedule(
            id INTEGER PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            day_name TEXT NOT NULL,
            lesson_number INTEGER NOT NULL,
            subject TEXT NOT NULL,
            time_start TEXT NOT NULL DEFAULT '',
            time_end TEXT NOT NULL DEFAULT '',
            teacher TEXT NOT NULL DEFAULT '',
            homework TEXT,
            notes TEXT,
            week_number INTEGER NOT NULL DEFAULT 1
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create schedule table: {e}"));
    }

    if let Err(e) = sqlx::query(
        "CREATE TABLE IF NOT EXISTS lesson_files(
            id INTEGER PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            schedule_id INTEGER NOT NULL REFERENCES schedule (id) ON DELETE CASCADE,
            file_name TEXT NOT NULL,
            file_url TEXT NOT NULL
        );",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create lesson_files table: {e}"));
    }

    if let Err(e) = sqlx::query(
        "CREATE INDEX IF NOT EXISTS schedule_week_idx ON schedule (week_number, lesson_number);",
    )
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create schedule index: {e}"));
    }

    if let Err(e) = transaction.commit().await {
        return Err(format!("Could not commit table-creation transaction: {e}"));
    };

    *POSTGRES.write().await = Some(pool);

    Ok(())
}
