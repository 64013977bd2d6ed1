pub mod memory;
pub mod model;
pub mod repo;
pub mod store;

pub use memory::InMemoryJobStore;
pub use model::{
    has_description, JobListing, NewJobListing, PendingListing, UpsertOutcome, SENTINEL_LOCATION,
};
pub use repo::JobListingsRepo;
pub use store::JobStore;
