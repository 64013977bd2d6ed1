use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;

use super::model::{JobListing, NewJobListing, PendingListing, UpsertOutcome};
use super::store::JobStore;

/// `JobStore` backed by a `Vec`, with the same dedup and completeness rules
/// as the Postgres table. Failures can be injected for tests.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    rows: Vec<JobListing>,
    next_id: i32,
    fail_next_upsert: Option<String>,
    failing_writes: HashSet<i32>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listings(&self) -> &[JobListing] {
        &self.rows
    }

    pub fn get(&self, id: i32) -> Option<&JobListing> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// The next `bulk_upsert` behaves like a database error mid-batch.
    pub fn fail_next_upsert(&mut self, reason: impl Into<String>) {
        self.fail_next_upsert = Some(reason.into());
    }

    /// `write_description` for this id returns an error.
    pub fn fail_writes_for(&mut self, id: i32) {
        self.failing_writes.insert(id);
    }

    /// Insert a row directly, bypassing dedup. Returns the new id.
    pub fn seed(&mut self, job_url: &str, description: Option<&str>) -> i32 {
        self.next_id += 1;
        self.rows.push(JobListing {
            id: self.next_id,
            job_title: Some("Seeded".to_string()),
            company_name: Some("Seeded".to_string()),
            location: Some("Remote".to_string()),
            job_url: job_url.to_string(),
            salary_info: None,
            job_description: description.map(str::to_string),
            source_site: Some("test".to_string()),
            scraped_at: Utc::now(),
        });
        self.next_id
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn bulk_upsert(&mut self, listings: &[NewJobListing]) -> UpsertOutcome {
        if listings.is_empty() {
            return UpsertOutcome::Committed { inserted: 0 };
        }
        if let Some(reason) = self.fail_next_upsert.take() {
            tracing::error!(error = %reason, "bulk insert failed, batch rolled back");
            return UpsertOutcome::RolledBack { reason };
        }

        let mut seen: HashSet<String> = self.rows.iter().map(|r| r.job_url.clone()).collect();
        let mut inserted = 0;
        let scraped_at = Utc::now();

        for l in listings {
            if !seen.insert(l.job_url.clone()) {
                continue;
            }
            self.next_id += 1;
            self.rows.push(JobListing {
                id: self.next_id,
                job_title: Some(l.job_title.clone()),
                company_name: Some(l.company_name.clone()),
                location: Some(l.location.clone()),
                job_url: l.job_url.clone(),
                salary_info: l.salary_info.clone(),
                job_description: None,
                source_site: Some(l.source_site.clone()),
                scraped_at,
            });
            inserted += 1;
        }

        UpsertOutcome::Committed { inserted }
    }

    async fn fetch_incomplete(&mut self, limit: Option<i64>) -> anyhow::Result<Vec<PendingListing>> {
        let mut pending: Vec<PendingListing> = self
            .rows
            .iter()
            .filter(|r| !r.is_complete())
            .map(|r| PendingListing {
                id: r.id,
                job_url: r.job_url.clone(),
            })
            .collect();
        pending.sort_by_key(|p| p.id);

        if let Some(n) = limit {
            pending.truncate(n.max(0) as usize);
        }
        Ok(pending)
    }

    async fn write_description(&mut self, id: i32, description: &str) -> anyhow::Result<()> {
        if self.failing_writes.contains(&id) {
            anyhow::bail!("simulated write failure for job listing {id}");
        }
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow::anyhow!("job listing {id} not found"))?;
        row.job_description = Some(description.to_string());
        Ok(())
    }
}
