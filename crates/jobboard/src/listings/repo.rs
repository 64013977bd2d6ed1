use async_trait::async_trait;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder, Transaction};

use super::model::{JobListing, NewJobListing, PendingListing, UpsertOutcome};
use super::store::JobStore;

// 6 binds per row keeps each statement well under the 65535 parameter cap.
const MAX_ROWS_PER_STATEMENT: usize = 5_000;

/// Postgres-backed `JobStore` over a single connection.
pub struct JobListingsRepo {
    conn: PgConnection,
}

impl JobListingsRepo {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Close the underlying connection. Errors are logged, not returned.
    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::warn!(error = %e, "error while closing database connection");
        }
    }

    pub async fn get_listing(&mut self, id: i32) -> anyhow::Result<Option<JobListing>> {
        let listing = sqlx::query_as::<_, JobListing>(
            r#"
            SELECT id, job_title, company_name, location, job_url,
                   salary_info, job_description, source_site, scraped_at
            FROM job_listings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut self.conn)
        .await?;

        Ok(listing)
    }

    pub async fn list_all(&mut self) -> anyhow::Result<Vec<JobListing>> {
        let listings = sqlx::query_as::<_, JobListing>(
            r#"
            SELECT id, job_title, company_name, location, job_url,
                   salary_info, job_description, source_site, scraped_at
            FROM job_listings
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut self.conn)
        .await?;

        Ok(listings)
    }

    /// (total, still missing a description)
    pub async fn counts(&mut self) -> anyhow::Result<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
              COUNT(*),
              COUNT(*) FILTER (WHERE job_description IS NULL OR job_description !~ '\S')
            FROM job_listings
            "#,
        )
        .fetch_one(&mut self.conn)
        .await?;

        Ok(row)
    }

    async fn insert_batch(
        tx: &mut Transaction<'_, Postgres>,
        listings: &[NewJobListing],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;

        for chunk in listings.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO job_listings \
                 (job_title, company_name, location, job_url, salary_info, source_site) ",
            );
            qb.push_values(chunk, |mut row, l| {
                row.push_bind(l.job_title.clone())
                    .push_bind(l.company_name.clone())
                    .push_bind(l.location.clone())
                    .push_bind(l.job_url.clone())
                    .push_bind(l.salary_info.clone())
                    .push_bind(l.source_site.clone());
            });
            qb.push(" ON CONFLICT (job_url) DO NOTHING");

            inserted += qb.build().execute(&mut **tx).await?.rows_affected();
        }

        Ok(inserted)
    }

    async fn try_bulk_upsert(&mut self, listings: &[NewJobListing]) -> Result<u64, sqlx::Error> {
        let mut tx = self.conn.begin().await?;

        match Self::insert_batch(&mut tx, listings).await {
            Ok(inserted) => {
                tx.commit().await?;
                Ok(inserted)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed insert also failed");
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl JobStore for JobListingsRepo {
    async fn bulk_upsert(&mut self, listings: &[NewJobListing]) -> UpsertOutcome {
        if listings.is_empty() {
            return UpsertOutcome::Committed { inserted: 0 };
        }

        match self.try_bulk_upsert(listings).await {
            Ok(inserted) => UpsertOutcome::Committed { inserted },
            Err(e) => {
                tracing::error!(error = %e, batch = listings.len(), "bulk insert failed, batch rolled back");
                UpsertOutcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch_incomplete(&mut self, limit: Option<i64>) -> anyhow::Result<Vec<PendingListing>> {
        // LIMIT NULL means no limit.
        let pending = sqlx::query_as::<_, PendingListing>(
            r#"
            SELECT id, job_url
            FROM job_listings
            WHERE job_description IS NULL
               OR job_description !~ '\S'
            ORDER BY id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut self.conn)
        .await?;

        Ok(pending)
    }

    async fn write_description(&mut self, id: i32, description: &str) -> anyhow::Result<()> {
        // autocommit: no transaction, so the row is durable once this returns
        let res = sqlx::query(
            r#"
            UPDATE job_listings
            SET job_description = $1
            WHERE id = $2
            "#,
        )
        .bind(description)
        .bind(id)
        .execute(&mut self.conn)
        .await?;

        if res.rows_affected() != 1 {
            anyhow::bail!("job listing {id} not found");
        }
        Ok(())
    }
}
