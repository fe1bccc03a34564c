//! Preflight existence checks for remote assets.
//!
//! Run before any heavyweight resource is acquired, so a missing
//! calibration or pattern file is reported without ever opening the
//! camera. Checks are HEAD-style (no body transfer) and never retried.

use ar_session_core::{AssetTransport, TransportError};
use log::{error, info};

/// One URL to verify, with a human-readable label for diagnostics.
#[derive(Clone, Debug)]
pub struct ProbeTarget {
    pub url: String,
    pub label: String,
}

impl ProbeTarget {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Outcome of a single existence check.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// 2xx status.
    Reachable { status: u16 },
    /// Request completed with a non-success status.
    BadStatus { status: u16 },
    /// Transport-level failure before any status arrived.
    Failed(TransportError),
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }
}

/// Per-target results of one preflight run.
#[derive(Debug)]
pub struct ProbeReport {
    pub checks: Vec<(ProbeTarget, ProbeOutcome)>,
}

impl ProbeReport {
    /// Aggregate success requires every target to be reachable.
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Labels of the targets that failed, for error reporting.
    pub fn missing_labels(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|(_, outcome)| !outcome.is_ok())
            .map(|(target, _)| target.label.clone())
            .collect()
    }
}

/// Check every target with an existence request. Failures are logged with
/// the offending URL; the caller decides whether to abort.
pub fn run_preflight<T: AssetTransport>(transport: &T, targets: &[ProbeTarget]) -> ProbeReport {
    let checks = targets
        .iter()
        .map(|target| {
            let outcome = match transport.head(&target.url) {
                Ok(status) if (200..300).contains(&status) => {
                    info!("{} confirmed (HTTP {status}): {}", target.label, target.url);
                    ProbeOutcome::Reachable { status }
                }
                Ok(status) => {
                    error!(
                        "{} fetch failed (HTTP {status}): {}",
                        target.label, target.url
                    );
                    ProbeOutcome::BadStatus { status }
                }
                Err(err) => {
                    error!("{} check failed: {err}", target.label);
                    ProbeOutcome::Failed(err)
                }
            };
            (target.clone(), outcome)
        })
        .collect();
    ProbeReport { checks }
}
