use chrono::{DateTime, Utc};

pub const SENTINEL_LOCATION: &str = "Remote";

/// A persisted `job_listings` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobListing {
    pub id: i32,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub job_url: String,
    pub salary_info: Option<String>,
    pub job_description: Option<String>,
    pub source_site: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl JobListing {
    pub fn is_complete(&self) -> bool {
        has_description(self.job_description.as_deref())
    }
}

/// A harvested candidate, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobListing {
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub job_url: String,
    pub salary_info: Option<String>,
    pub source_site: String,
}

/// A record still waiting for its description.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingListing {
    pub id: i32,
    pub job_url: String,
}

/// Result of a batch insert. A rolled-back batch inserted nothing, but unlike
/// `Committed { inserted: 0 }` it means the batch never landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Committed { inserted: u64 },
    RolledBack { reason: String },
}

impl UpsertOutcome {
    pub fn inserted(&self) -> u64 {
        match self {
            UpsertOutcome::Committed { inserted } => *inserted,
            UpsertOutcome::RolledBack { .. } => 0,
        }
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, UpsertOutcome::RolledBack { .. })
    }
}

/// A description counts only if it has at least one non-whitespace character.
pub fn has_description(description: Option<&str>) -> bool {
    description.is_some_and(|d| !d.trim().is_empty())
}
