use async_trait::async_trait;

use super::model::{NewJobListing, PendingListing, UpsertOutcome};

/// CRUD surface shared by both phases.
///
/// Methods take `&mut self`: a store wraps a single connection and is used
/// strictly one statement at a time.
#[async_trait]
pub trait JobStore: Send {
    /// Insert every candidate whose `job_url` is new, as one atomic batch.
    /// Database errors roll the batch back and come back as
    /// [`UpsertOutcome::RolledBack`] instead of an `Err`.
    async fn bulk_upsert(&mut self, listings: &[NewJobListing]) -> UpsertOutcome;

    /// Records without a usable description, ascending by id.
    async fn fetch_incomplete(&mut self, limit: Option<i64>) -> anyhow::Result<Vec<PendingListing>>;

    /// Set one record's description and commit it right away.
    async fn write_description(&mut self, id: i32, description: &str) -> anyhow::Result<()>;
}
