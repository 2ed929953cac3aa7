//! Command handlers. A fatal harvest failure leaves a page dump behind and
//! surfaces as a non-zero exit; skipped tiles never do.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use gridharvest_core::{AppConfig, HarvestResult, RunSummary, StoreProfile};
use gridharvest_scraper::{
    Canceller, Document, Harvester, NoPacer, Pacer, RandomPacer, RunGuard, SessionOptions,
    StaticDocument, WebDriverDocument,
};

const WINDOW_SIZE: (u32, u32) = (1920, 1080);

fn load_store(config: &AppConfig, key: &str) -> anyhow::Result<StoreProfile> {
    let stores = gridharvest_core::load_stores(&config.stores_path).with_context(|| {
        format!(
            "failed to load stores from {}",
            config.stores_path.display()
        )
    })?;
    stores.find(key).cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "store '{key}' not found in {}",
            config.stores_path.display()
        )
    })
}

/// Print every configured store.
pub(crate) fn list_stores(config: &AppConfig) -> anyhow::Result<()> {
    let stores = gridharvest_core::load_stores(&config.stores_path).with_context(|| {
        format!(
            "failed to load stores from {}",
            config.stores_path.display()
        )
    })?;
    for store in &stores.stores {
        println!("{:<20} {:<20} {}", store.slug(), store.name, store.seed_url);
    }
    Ok(())
}

/// Harvest a store's seed page in a fresh browser session.
///
/// # Errors
///
/// Returns an error if the session cannot be opened, the seed page never
/// loads, or the results cannot be written.
pub(crate) async fn run_live(
    config: &AppConfig,
    key: &str,
    output_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let store = load_store(config, key)?;
    let output_dir = output_dir.unwrap_or(config.output_dir.as_path());

    let options = SessionOptions {
        server_url: config.webdriver_url.clone(),
        headless: config.headless,
        user_agent: config.user_agent.clone(),
        window_size: WINDOW_SIZE,
    };
    let doc = WebDriverDocument::open(&options)
        .await
        .with_context(|| format!("failed to open browser session at {}", options.server_url))?;

    let outcome = match doc.goto(&store.seed_url).await {
        Ok(()) => harvest_and_persist(config, &store, &doc, RandomPacer, output_dir).await,
        Err(e) => Err(anyhow::Error::new(e).context(format!("failed to load {}", store.seed_url))),
    };

    if outcome.is_err() {
        dump_page_best_effort(&doc, output_dir, &store.slug()).await;
    }
    if let Err(e) = doc.quit().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }
    outcome
}

/// Harvest a saved page through the same engine, without a browser.
///
/// # Errors
///
/// Returns an error if the page cannot be read, the harvest fails, or the
/// results cannot be written.
pub(crate) async fn run_replay(
    config: &AppConfig,
    key: &str,
    html: &Path,
    output_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let store = load_store(config, key)?;
    let output_dir = output_dir.unwrap_or(config.output_dir.as_path());
    let source = std::fs::read_to_string(html)
        .with_context(|| format!("failed to read {}", html.display()))?;
    let doc = StaticDocument::parse(source);
    harvest_and_persist(config, &store, &doc, NoPacer, output_dir).await
}

async fn harvest_and_persist<D: Document, P: Pacer>(
    config: &AppConfig,
    store: &StoreProfile,
    doc: &D,
    pacer: P,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let (guard, canceller) = RunGuard::new(config.run_timeout());
    let signal = tokio::spawn(cancel_on_ctrl_c(canceller));
    let started_at = Utc::now();

    let harvested = Harvester::new(store, pacer, guard)
        .with_ready_timeout(Duration::from_secs(config.ready_timeout_secs))
        .harvest(doc)
        .await;
    signal.abort();

    let result = harvested.with_context(|| format!("harvest of '{}' failed", store.name))?;
    persist(store, &result, started_at, output_dir)
}

async fn cancel_on_ctrl_c(canceller: Canceller) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("received ctrl-c, stopping at the next checkpoint");
        canceller.cancel();
    }
}

fn persist(
    store: &StoreProfile,
    result: &HarvestResult,
    started_at: DateTime<Utc>,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let summary = RunSummary::from_result(&store.name, result, started_at, Utc::now());
    let paths = gridharvest_core::write_run(output_dir, &store.slug(), result, &summary)
        .context("failed to write harvest output")?;

    tracing::info!(
        store = %store.name,
        records = result.records.len(),
        skipped = result.skipped.len(),
        stop = %result.pagination_stop,
        interrupted = result.interrupted,
        "harvest saved"
    );
    println!(
        "{}: {} products, {} skipped -> {}",
        store.name,
        result.records.len(),
        result.skipped.len(),
        paths.products.display()
    );
    if result.interrupted {
        println!(
            "{}: run interrupted after {} of the revealed tiles",
            store.name,
            result.attempted()
        );
    }
    Ok(())
}

/// Save the current page source for postmortem. Failures are only logged.
async fn dump_page_best_effort<D: Document>(doc: &D, output_dir: &Path, slug: &str) {
    let html = match doc.page_source().await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(error = %e, "could not read page source for failure dump");
            return;
        }
    };
    match gridharvest_core::write_failure_dump(output_dir, slug, &html) {
        Ok(path) => tracing::warn!(path = %path.display(), "saved page dump after failure"),
        Err(e) => tracing::warn!(error = %e, "could not write failure dump"),
    }
}
