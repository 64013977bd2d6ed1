mod common;

use common::LISTING_PAGE;

use jobboard::ingest::ingest;
use jobboard::listings::{InMemoryJobStore, JobStore, SENTINEL_LOCATION};
use jobboard::harvest::SiteProfile;

#[tokio::test]
async fn harvest_then_ingest_is_idempotent() {
    let profile = SiteProfile::weworkremotely().unwrap();
    let mut store = InMemoryJobStore::new();

    let harvested = profile.parse_listings(LISTING_PAGE);
    assert_eq!(harvested.len(), 2, "the ad without a detail link is dropped");

    let first = ingest(&mut store, &harvested).await;
    assert_eq!(first.found, 2);
    assert_eq!(first.inserted(), 2);

    let again = profile.parse_listings(LISTING_PAGE);
    let second = ingest(&mut store, &again).await;
    assert_eq!(second.found, 2);
    assert_eq!(second.inserted(), 0);
    assert!(!second.failed());

    let urls: Vec<&str> = store.listings().iter().map(|l| l.job_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://weworkremotely.com/remote-jobs/acme-staff-engineer",
            "https://weworkremotely.com/remote-jobs/globex-rails-developer",
        ]
    );
}

#[tokio::test]
async fn harvested_fields_land_in_the_store() {
    let profile = SiteProfile::weworkremotely().unwrap();
    let mut store = InMemoryJobStore::new();

    ingest(&mut store, &profile.parse_listings(LISTING_PAGE)).await;

    let acme = &store.listings()[0];
    assert_eq!(acme.job_title.as_deref(), Some("Staff Engineer"));
    assert_eq!(acme.company_name.as_deref(), Some("Acme Corp"));
    assert_eq!(acme.location.as_deref(), Some("Toronto, Canada"));
    assert_eq!(acme.salary_info.as_deref(), Some("$150,000 or more USD"));
    assert_eq!(acme.source_site.as_deref(), Some("WeWorkRemotely"));
    assert_eq!(acme.job_description, None);

    // legacy markup, no location anywhere
    let globex = &store.listings()[1];
    assert_eq!(globex.job_title.as_deref(), Some("Rails Developer"));
    assert_eq!(globex.company_name.as_deref(), Some("Globex"));
    assert_eq!(globex.location.as_deref(), Some(SENTINEL_LOCATION));
    assert_eq!(globex.salary_info, None);
}

#[tokio::test]
async fn freshly_ingested_listings_are_all_pending() {
    let profile = SiteProfile::weworkremotely().unwrap();
    let mut store = InMemoryJobStore::new();

    ingest(&mut store, &profile.parse_listings(LISTING_PAGE)).await;

    let pending = store.fetch_incomplete(None).await.unwrap();
    let ids: Vec<i32> = pending.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}
