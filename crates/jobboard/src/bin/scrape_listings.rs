use jobboard::config::{DbConfig, HarvestConfig};
use jobboard::db;
use jobboard::harvest::{Harvester, SiteProfile};
use jobboard::ingest::{self, IngestReport};
use jobboard::telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let (db_cfg, harvest_cfg) = match (DbConfig::from_env(), HarvestConfig::from_env()) {
        (Ok(db), Ok(harvest)) => (db, harvest),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    let harvester = Harvester::new(SiteProfile::weworkremotely()?, harvest_cfg.http_timeout)?;
    let listing_url = harvest_cfg.listing_url.clone();

    let result = db::with_listings(&db_cfg, move |repo| {
        db::boxed(async move {
            Ok::<_, anyhow::Error>(ingest::discover(&harvester, repo, &listing_url).await)
        })
    })
    .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = ?e, "database unavailable");
            eprintln!("ERROR: {e:#}");
            std::process::exit(1);
        }
    };

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &IngestReport) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("JOB SCRAPING COMPLETED!");
    println!("{rule}");
    println!("Jobs found on page: {}", report.found);
    if report.failed() {
        println!("New jobs inserted into database: 0 (insert failed and was rolled back; see log)");
    } else {
        println!("New jobs inserted into database: {}", report.inserted());
    }
    println!("{rule}");
}
