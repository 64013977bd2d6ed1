//! Phase 2: complete listings that still lack a description.
//!
//! Records are attempted one at a time in ascending id order. Each success is
//! written (and committed) before the next page is touched, so an interrupted
//! run only loses the record in flight. Failed pages are left blank and are
//! picked up again by the next run.

pub mod render;

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use tokio::time::timeout;

use crate::config::BackfillConfig;
use crate::listings::{has_description, JobStore, PendingListing};
pub use render::{PageRenderer, RenderError};

/// Extra time on top of the element wait for the navigation itself.
const NAVIGATION_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Records attempted, whatever the outcome.
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Incomplete records found at the start of the run.
    pub pending: usize,
    pub interrupted: bool,
}

impl BackfillReport {
    fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Run one backfill pass.
///
/// `open_session` is only called when there is work to do. The session is
/// closed before this returns, including when `shutdown` resolves mid-run or
/// a description write fails. A shutdown that arrives while the session is
/// still starting lets it finish starting, then closes it without processing
/// anything.
pub async fn run<S, R, Open, OpenFut, Shutdown>(
    store: &mut S,
    open_session: Open,
    cfg: &BackfillConfig,
    shutdown: Shutdown,
) -> anyhow::Result<BackfillReport>
where
    S: JobStore + ?Sized,
    R: PageRenderer,
    Open: FnOnce() -> OpenFut,
    OpenFut: Future<Output = anyhow::Result<R>>,
    Shutdown: Future<Output = ()>,
{
    let pending = store
        .fetch_incomplete(cfg.limit)
        .await
        .context("failed to load incomplete job listings")?;

    let mut report = BackfillReport {
        pending: pending.len(),
        ..BackfillReport::default()
    };

    if pending.is_empty() {
        tracing::info!("all jobs in the database already have a description; no work to do");
        return Ok(report);
    }

    tracing::info!(count = pending.len(), "found jobs to process; starting browser session");
    tokio::pin!(shutdown);
    let opening = open_session();
    tokio::pin!(opening);

    let mut session = tokio::select! {
        biased;
        _ = &mut shutdown => {
            tracing::warn!("interrupted while the browser was starting; closing it once it is up");
            let mut session = opening.await.context("failed to start browser session")?;
            close_session(&mut session).await;
            report.interrupted = true;
            return Ok(report);
        }
        opened = &mut opening => opened.context("failed to start browser session")?,
    };

    let result = tokio::select! {
        biased;
        _ = &mut shutdown => {
            tracing::warn!("interrupted; unfinished records stay pending for the next run");
            Ok(())
        }
        res = process_all(&mut session, store, &pending, cfg, &mut report) => res,
    };
    if result.is_ok() && report.processed < pending.len() {
        report.interrupted = true;
    }

    close_session(&mut session).await;
    result.map(|()| report)
}

async fn close_session<R: PageRenderer>(session: &mut R) {
    tracing::info!("closing browser session");
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "browser session did not close cleanly");
    }
}

async fn process_all<S, R>(
    session: &mut R,
    store: &mut S,
    pending: &[PendingListing],
    cfg: &BackfillConfig,
    report: &mut BackfillReport,
) -> anyhow::Result<()>
where
    S: JobStore + ?Sized,
    R: PageRenderer,
{
    let total = pending.len();

    for (i, job) in pending.iter().enumerate() {
        if i > 0 && !cfg.pace.is_zero() {
            tokio::time::sleep(cfg.pace).await;
        }

        tracing::info!(job_id = job.id, "[{}/{}] processing job", i + 1, total);
        let outcome = backfill_one(session, store, job, cfg).await?;
        report.record(outcome);
    }

    Ok(())
}

/// Render one detail page and persist its description. Render problems are
/// logged and reported as `Skipped`; a failed write is returned as an error.
pub async fn backfill_one<S, R>(
    session: &mut R,
    store: &mut S,
    job: &PendingListing,
    cfg: &BackfillConfig,
) -> anyhow::Result<RecordOutcome>
where
    S: JobStore + ?Sized,
    R: PageRenderer,
{
    let selector = cfg.description_selector.as_str();
    let render = session.render_text(&job.job_url, selector, cfg.render_timeout);

    let bound = cfg.render_timeout.saturating_add(NAVIGATION_GRACE);

    let rendered = match timeout(bound, render).await {
        Ok(inner) => inner,
        Err(_) => Err(RenderError::Timeout {
            url: job.job_url.clone(),
            selector: selector.to_string(),
            timeout: bound,
        }),
    };

    let text = match rendered {
        Ok(text) => text,
        Err(e) if e.is_timeout() => {
            tracing::warn!(job_id = job.id, url = %job.job_url, error = %e, "description not found in time; skipping");
            return Ok(RecordOutcome::Skipped);
        }
        Err(e) => {
            tracing::error!(job_id = job.id, url = %job.job_url, error = %e, "failed to scrape description; skipping");
            return Ok(RecordOutcome::Skipped);
        }
    };

    if !has_description(Some(&text)) {
        tracing::warn!(job_id = job.id, "description element was empty; skipping");
        return Ok(RecordOutcome::Skipped);
    }

    store
        .write_description(job.id, text.trim())
        .await
        .with_context(|| format!("failed to save description for job {}", job.id))?;

    tracing::info!(job_id = job.id, "successfully updated job");
    Ok(RecordOutcome::Updated)
}
