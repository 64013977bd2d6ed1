mod browser;

use std::sync::Arc;

use anyhow::Context;
use browser::FirefoxSession;
use jobboard::backfill::{self, BackfillReport};
use jobboard::config::{BackfillConfig, DbConfig};
use jobboard::{db, telemetry};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::Notify;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let (db_cfg, cfg) = match (DbConfig::from_env(), BackfillConfig::from_env()) {
        (Ok(db), Ok(cfg)) => (db, cfg),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        selector = %cfg.description_selector,
        limit = ?cfg.limit,
        webdriver = %cfg.webdriver_url,
        "description backfill starting"
    );

    let stop = match install_signal_handlers() {
        Ok(stop) => stop,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            std::process::exit(1);
        }
    };

    let result = db::with_listings(&db_cfg, move |repo| {
        db::boxed(async move {
            let webdriver_url = cfg.webdriver_url.clone();
            let headless = cfg.headless;
            let shutdown = async move { stop.notified().await };

            backfill::run(
                repo,
                || FirefoxSession::connect(&webdriver_url, headless),
                &cfg,
                shutdown,
            )
            .await
        })
    })
    .await;

    match result {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = ?e, "backfill aborted");
            eprintln!("ERROR: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Listen for SIGINT and SIGTERM from startup on. The first signal asks the
/// run to stop after closing the browser; a second one exits immediately.
fn install_signal_handlers() -> anyhow::Result<Arc<Notify>> {
    let mut interrupt = signal(SignalKind::interrupt()).context("failed to listen for SIGINT")?;
    let mut terminate = signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?;

    let stop = Arc::new(Notify::new());
    let notify = stop.clone();

    tokio::spawn(async move {
        let name = next_signal(&mut interrupt, &mut terminate).await;
        tracing::warn!(signal = name, "shutdown requested; send it again to exit immediately");
        notify.notify_one();

        let name = next_signal(&mut interrupt, &mut terminate).await;
        tracing::error!(signal = name, "second signal; exiting without cleanup");
        std::process::exit(130);
    });

    Ok(stop)
}

async fn next_signal(interrupt: &mut Signal, terminate: &mut Signal) -> &'static str {
    tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

fn print_summary(report: &BackfillReport) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    if report.interrupted {
        println!("DESCRIPTION SCRAPING INTERRUPTED");
    } else {
        println!("DESCRIPTION SCRAPING COMPLETED!");
    }
    println!("{rule}");
    println!("Jobs processed: {}", report.processed);
    println!("Successfully updated: {}", report.updated);
    if report.interrupted {
        println!("Left for next run: {}", report.pending - report.updated);
    }
    println!("{rule}");
}
