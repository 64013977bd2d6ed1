#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobboard::backfill::{PageRenderer, RenderError};
use jobboard::config::BackfillConfig;
use sqlx::{Connection, PgConnection};
use tokio::sync::Notify;

/// Category page with three items: a primary-markup posting, an ad without a
/// detail link, and a legacy-markup posting.
pub const LISTING_PAGE: &str = r#"
<html><body>
<section id="category-2" class="jobs">
  <ul>
    <li class="new-listing-container">
      <a href="/company/acme">Acme</a>
      <a href="/remote-jobs/acme-staff-engineer">
        <h4 class="new-listing__header__title">Staff Engineer</h4>
        <p class="new-listing__company-name">Acme Corp</p>
        <p class="new-listing__company-headquarters">Toronto, Canada</p>
        <div class="new-listing__categories">
          <p class="new-listing__categories__category">Full-Time</p>
          <p class="new-listing__categories__category">$150,000 or more USD</p>
        </div>
      </a>
    </li>
    <li class="feature ad">
      <a href="/advertise"><span class="title">Post a job</span><span class="company">WWR</span></a>
    </li>
    <li>
      <a href="/remote-jobs/globex-rails-developer">
        <span class="company">Globex</span>
        <span class="title">Rails Developer</span>
      </a>
    </li>
  </ul>
</section>
</body></html>
"#;

pub fn fast_config() -> BackfillConfig {
    BackfillConfig {
        pace: Duration::ZERO,
        render_timeout: Duration::from_millis(50),
        ..BackfillConfig::default()
    }
}

#[derive(Clone)]
pub enum Script {
    Text(&'static str),
    Timeout,
    Fail(&'static str),
    /// Never finish, like a navigation that stalls.
    Hang,
    /// Fire the shutdown signal, then never finish.
    InterruptAndHang,
}

#[derive(Default)]
pub struct RendererLog {
    pub visited: Vec<String>,
    pub closed: usize,
}

/// Renderer that answers from a per-URL script and records what it did.
#[derive(Clone)]
pub struct ScriptedRenderer {
    scripts: HashMap<String, Script>,
    pub log: Arc<Mutex<RendererLog>>,
    pub shutdown: Arc<Notify>,
}

impl ScriptedRenderer {
    pub fn new(scripts: impl IntoIterator<Item = (String, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            log: Arc::new(Mutex::new(RendererLog::default())),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn visited(&self) -> Vec<String> {
        self.log.lock().unwrap().visited.clone()
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub fn shutdown_signal(&self) -> impl std::future::Future<Output = ()> {
        let notify = self.shutdown.clone();
        async move { notify.notified().await }
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render_text(
        &mut self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        self.log.lock().unwrap().visited.push(url.to_string());

        match self.scripts.get(url).cloned() {
            Some(Script::Text(text)) => Ok(text.to_string()),
            Some(Script::Timeout) => Err(RenderError::Timeout {
                url: url.to_string(),
                selector: selector.to_string(),
                timeout,
            }),
            Some(Script::Fail(reason)) => Err(RenderError::Navigation {
                url: url.to_string(),
                reason: reason.to_string(),
            }),
            Some(Script::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Some(Script::InterruptAndHang) => {
                self.shutdown.notify_one();
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(RenderError::Navigation {
                url: url.to_string(),
                reason: "no script for url".to_string(),
            }),
        }
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Connection to `TEST_DATABASE_URL` with an empty `job_listings` table, or
/// `None` when no test database is configured.
pub async fn setup_db() -> Option<PgConnection> {
    let _ = dotenvy::dotenv();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping Postgres test");
        return None;
    };

    let mut conn = PgConnection::connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    jobboard::db::ensure_table(&mut conn)
        .await
        .expect("failed to create job_listings");

    sqlx::query("TRUNCATE TABLE job_listings RESTART IDENTITY")
        .execute(&mut conn)
        .await
        .expect("truncate failed");

    Some(conn)
}
