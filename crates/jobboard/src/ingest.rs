use crate::harvest::Harvester;
use crate::listings::{JobStore, NewJobListing, UpsertOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Candidates produced by the harvest.
    pub found: usize,
    pub outcome: UpsertOutcome,
}

impl IngestReport {
    pub fn inserted(&self) -> u64 {
        self.outcome.inserted()
    }

    pub fn failed(&self) -> bool {
        self.outcome.is_rolled_back()
    }
}

/// Upsert a harvested batch. Duplicate URLs are skipped by the store; a
/// failed batch is already logged there and shows up as `RolledBack`.
pub async fn ingest<S>(store: &mut S, listings: &[NewJobListing]) -> IngestReport
where
    S: JobStore + ?Sized,
{
    if listings.is_empty() {
        return IngestReport {
            found: 0,
            outcome: UpsertOutcome::Committed { inserted: 0 },
        };
    }

    tracing::info!(count = listings.len(), "inserting jobs into the database");
    let outcome = store.bulk_upsert(listings).await;

    match &outcome {
        UpsertOutcome::Committed { inserted } => tracing::info!(
            found = listings.len(),
            inserted = *inserted,
            skipped = (listings.len() as u64).saturating_sub(*inserted),
            "batch committed"
        ),
        UpsertOutcome::RolledBack { reason } => {
            tracing::warn!(found = listings.len(), reason = %reason, "batch discarded; rerun to retry")
        }
    }

    IngestReport {
        found: listings.len(),
        outcome,
    }
}

/// Phase 1: harvest one listing page and ingest whatever it yields.
pub async fn discover<S>(harvester: &Harvester, store: &mut S, listing_url: &str) -> IngestReport
where
    S: JobStore + ?Sized,
{
    let listings = harvester.harvest(listing_url).await;
    if listings.is_empty() {
        tracing::warn!(url = listing_url, "no jobs were found");
    }
    ingest(store, &listings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::InMemoryJobStore;

    fn candidate(url: &str) -> NewJobListing {
        NewJobListing {
            job_title: "Engineer".into(),
            company_name: "Acme".into(),
            location: "Remote".into(),
            job_url: url.into(),
            salary_info: Some("$120k".into()),
            source_site: "WeWorkRemotely".into(),
        }
    }

    #[tokio::test]
    async fn empty_batch_never_reaches_the_store() {
        let mut store = InMemoryJobStore::new();
        // would roll back if the store were called
        store.fail_next_upsert("should not be used");

        let report = ingest(&mut store, &[]).await;
        assert_eq!(report.found, 0);
        assert_eq!(report.inserted(), 0);
        assert!(!report.failed());
    }

    #[tokio::test]
    async fn reingesting_the_same_batch_inserts_nothing() {
        let mut store = InMemoryJobStore::new();
        let batch = vec![candidate("https://x/a"), candidate("https://x/b")];

        let first = ingest(&mut store, &batch).await;
        assert_eq!(first.inserted(), 2);

        let second = ingest(&mut store, &batch).await;
        assert_eq!(second.found, 2);
        assert_eq!(second.inserted(), 0);
        assert!(!second.failed());
        assert_eq!(store.listings().len(), 2);
    }

    #[tokio::test]
    async fn failed_batch_is_distinguishable_from_nothing_new() {
        let mut store = InMemoryJobStore::new();
        store.fail_next_upsert("connection reset by peer");

        let report = ingest(&mut store, &[candidate("https://x/a")]).await;
        assert_eq!(report.inserted(), 0);
        assert!(report.failed());
        assert!(store.listings().is_empty());

        // the failure is not sticky; a rerun lands the batch
        let retry = ingest(&mut store, &[candidate("https://x/a")]).await;
        assert_eq!(retry.inserted(), 1);
    }
}
