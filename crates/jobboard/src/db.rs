use std::pin::Pin;

use anyhow::Context;
use sqlx::{postgres::PgConnectOptions, ConnectOptions, Executor, PgConnection};

use crate::config::DbConfig;
use crate::listings::JobListingsRepo;

pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Database used for administrative statements such as `CREATE DATABASE`.
const MAINTENANCE_DB: &str = "postgres";

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS job_listings (
    id SERIAL PRIMARY KEY,
    job_title VARCHAR(255),
    company_name VARCHAR(255),
    location VARCHAR(255),
    job_url VARCHAR(512) NOT NULL UNIQUE,
    salary_info TEXT,
    job_description TEXT,
    source_site VARCHAR(100),
    scraped_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Created,
    AlreadyExists,
}

pub fn connect_options(cfg: &DbConfig, database: &str) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(database)
}

pub async fn connect_to(cfg: &DbConfig, database: &str) -> anyhow::Result<PgConnection> {
    connect_options(cfg, database)
        .connect()
        .await
        .with_context(|| {
            format!(
                "failed to connect to database {database:?} at {}:{} as {}",
                cfg.host, cfg.port, cfg.user
            )
        })
}

pub async fn connect(cfg: &DbConfig) -> anyhow::Result<PgConnection> {
    connect_to(cfg, &cfg.database).await
}

/// Open one connection, hand a repo over it to `f`, then close it whether or
/// not `f` succeeded.
pub async fn with_listings<T, F>(cfg: &DbConfig, f: F) -> anyhow::Result<T>
where
    F: for<'a> FnOnce(&'a mut JobListingsRepo) -> BoxFuture<'a, anyhow::Result<T>>,
{
    let mut repo = JobListingsRepo::new(connect(cfg).await?);
    tracing::info!(database = %cfg.database, "database connection established");

    let result = f(&mut repo).await;

    repo.close().await;
    tracing::info!("database connection closed");
    result
}

pub fn boxed<'a, T>(fut: impl std::future::Future<Output = T> + Send + 'a) -> BoxFuture<'a, T> {
    Box::pin(fut)
}

/// Create the target database if it is missing, then the `job_listings`
/// table. Safe to run repeatedly.
pub async fn ensure_schema(cfg: &DbConfig) -> anyhow::Result<DatabaseStatus> {
    let status = ensure_database(cfg).await?;

    let mut conn = connect(cfg).await?;
    let created = ensure_table(&mut conn).await;
    close_quietly(conn).await;
    created.context("failed to create job_listings table")?;

    Ok(status)
}

pub async fn ensure_database(cfg: &DbConfig) -> anyhow::Result<DatabaseStatus> {
    let mut admin = connect_to(cfg, MAINTENANCE_DB).await?;
    let status = create_database_if_missing(&mut admin, &cfg.database).await;
    close_quietly(admin).await;
    status
}

pub async fn ensure_table(conn: &mut PgConnection) -> anyhow::Result<()> {
    sqlx::query(CREATE_TABLE_SQL).execute(&mut *conn).await?;
    Ok(())
}

async fn create_database_if_missing(
    admin: &mut PgConnection,
    database: &str,
) -> anyhow::Result<DatabaseStatus> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(database)
            .fetch_one(&mut *admin)
            .await
            .context("failed to look up pg_database")?;

    if exists {
        return Ok(DatabaseStatus::AlreadyExists);
    }

    // CREATE DATABASE takes no bind parameters; send it over the simple protocol.
    let create = format!("CREATE DATABASE {}", quote_ident(database));
    admin
        .execute(create.as_str())
        .await
        .with_context(|| format!("failed to create database {database:?}"))?;

    Ok(DatabaseStatus::Created)
}

async fn close_quietly(conn: PgConnection) {
    use sqlx::Connection;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "error while closing database connection");
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("remote_jobs"), "\"remote_jobs\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
