use jobboard::config::DbConfig;
use jobboard::db::{self, DatabaseStatus};
use jobboard::telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    telemetry::init();

    let cfg = match DbConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "Ensuring database '{}' and table 'job_listings' exist on {}:{}...",
        cfg.database, cfg.host, cfg.port
    );

    match db::ensure_schema(&cfg).await {
        Ok(DatabaseStatus::Created) => println!("Database '{}' created successfully.", cfg.database),
        Ok(DatabaseStatus::AlreadyExists) => println!("Database '{}' already exists.", cfg.database),
        Err(e) => {
            eprintln!("Error during database setup: {e:#}");
            std::process::exit(1);
        }
    }

    println!("Table 'job_listings' is ready.");

    let counts = db::with_listings(&cfg, |repo| db::boxed(repo.counts())).await;
    match counts {
        Ok((total, incomplete)) => {
            println!("Listings stored: {total} ({incomplete} still missing a description)")
        }
        Err(e) => tracing::warn!(error = ?e, "could not count existing listings"),
    }
    println!("\nDatabase and table setup completed successfully.");
}
