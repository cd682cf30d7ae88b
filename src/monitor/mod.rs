//! Cycle orchestration.
//!
//! Walks the configured targets sequentially: fetch, extract, detect,
//! notify on change, prune. Every stage hands back an explicit result the
//! loop matches on; a failure at any stage is logged, recorded in the
//! report, and never stops the remaining targets. The orchestrator itself
//! holds no state across cycles.

pub mod detector;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::extract;
use crate::fetch::Fetcher;
use crate::notify::Notifier;
use crate::store::{self, SnapshotStore};
use self::detector::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetStatus {
    FirstObservation,
    Unchanged,
    Changed,
    FetchFailed,
    EmptyContent,
}

#[derive(Debug, Serialize)]
pub struct TargetReport {
    pub url: String,
    pub status: TargetStatus,
    pub notified: bool,
}

#[derive(Serialize)]
pub struct CycleReport {
    pub targets: Vec<TargetReport>,
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

impl CycleReport {
    pub fn empty() -> Self {
        CycleReport {
            targets: Vec::new(),
            diagnostics: Vec::new(),
            duration_ms: None,
        }
    }

    pub fn count(&self, status: TargetStatus) -> usize {
        self.targets.iter().filter(|t| t.status == status).count()
    }
}

/// Runs one full check cycle over every configured target.
pub fn run_cycle(
    config: &Config,
    fetcher: &dyn Fetcher,
    notifier: &dyn Notifier,
    store: &mut dyn SnapshotStore,
) -> CycleReport {
    let start = std::time::Instant::now();
    let mut report = CycleReport::empty();

    for url in &config.urls {
        let target = check_target(
            config,
            fetcher,
            notifier,
            &mut *store,
            url,
            &mut report.diagnostics,
        );
        report.targets.push(target);
    }

    report.duration_ms = Some(start.elapsed().as_millis());
    report
}

fn check_target(
    config: &Config,
    fetcher: &dyn Fetcher,
    notifier: &dyn Notifier,
    store: &mut dyn SnapshotStore,
    url: &str,
    diagnostics: &mut Vec<String>,
) -> TargetReport {
    info!(url, "checking target");

    let html = match fetcher.fetch(url) {
        Ok(html) => html,
        Err(e) => {
            error!(url, error = %e, "fetch failed, skipping target this cycle");
            diagnostics.push(format!("{url}: fetch failed: {e}"));
            return TargetReport {
                url: url.to_string(),
                status: TargetStatus::FetchFailed,
                notified: false,
            };
        }
    };

    let text = match extract::visible_text(&html) {
        Some(text) => text,
        None => {
            warn!(url, "no visible text extracted, skipping target this cycle");
            diagnostics.push(format!("{url}: no visible text extracted"));
            return TargetReport {
                url: url.to_string(),
                status: TargetStatus::EmptyContent,
                notified: false,
            };
        }
    };

    let outcome = detector::apply(&mut *store, url, &text);

    let mut notified = false;
    match outcome {
        Outcome::FirstObservation => {
            info!(url, "first observation, stored initial snapshot");
        }
        Outcome::Unchanged => {
            info!(url, "no change");
        }
        Outcome::Changed => {
            info!(url, "change detected");
            if !config.notify {
                info!(url, "notifications disabled, not sending");
            } else {
                match notifier.send(url) {
                    Ok(()) => {
                        notified = true;
                        info!(url, "notification sent");
                    }
                    Err(e) => {
                        // the snapshot stays stored; next cycle compares against
                        // the latest true content, not a stale one
                        warn!(url, error = %e, "notification not sent");
                        diagnostics.push(format!("{url}: notification not sent: {e}"));
                    }
                }
            }
        }
    }

    // retention runs after every detection outcome; pruning an
    // already-pruned history is a no-op
    let key = store::target_key(url);
    match store.prune(&key, config.keep) {
        Ok(0) => {}
        Ok(n) => info!(url, pruned = n, "pruned old snapshots"),
        Err(e) => {
            warn!(url, error = %e, "prune failed, extra snapshots remain until the next attempt");
            diagnostics.push(format!("{url}: prune failed: {e}"));
        }
    }

    let status = match outcome {
        Outcome::FirstObservation => TargetStatus::FirstObservation,
        Outcome::Unchanged => TargetStatus::Unchanged,
        Outcome::Changed => TargetStatus::Changed,
    };

    TargetReport {
        url: url.to_string(),
        status,
        notified,
    }
}
