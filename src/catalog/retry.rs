//! Session-scoped orchestration of verify → ensure with bounded backoff.
//!
//! The controller is a plain state machine. Time is handed in by the caller
//! (`Instant`), pending retries are deadlines rather than threads, and the
//! owner drives progress with [`RetryController::poll`]. `run_blocking` wraps
//! that loop with real sleeps for synchronous callers.
//!
//! State transitions:
//!
//! ```text
//! Idle ──activate──▶ Running ──▶ Verified
//!                       │
//!                       ▼
//!                    Errored ──(retry_count < max, after backoff)──▶ Running
//! ```

use crate::catalog::Catalog;
use crate::catalog::model::ReconciliationResult;
use crate::core::output;
use crate::core::store::CatalogStore;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^retry_count`, saturating.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry_count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    Idle,
    Running,
    Verified,
    Errored,
}

/// What callers branch on; carries no retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Verified,
    Errored,
}

/// Consumer-facing snapshot: `{is_loading, is_verified, error, result}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub is_loading: bool,
    pub is_verified: bool,
    pub error: Option<String>,
    pub result: Option<ReconciliationResult>,
}

pub struct RetryController<S: CatalogStore> {
    catalog: Catalog<S>,
    policy: RetryPolicy,
    state: ControllerState,
    has_run: bool,
    retry_count: u32,
    next_retry_at: Option<Instant>,
    error: Option<String>,
    result: Option<ReconciliationResult>,
}

impl<S: CatalogStore> RetryController<S> {
    pub fn new(catalog: Catalog<S>) -> Self {
        Self::with_policy(catalog, RetryPolicy::default())
    }

    pub fn with_policy(catalog: Catalog<S>, policy: RetryPolicy) -> Self {
        Self {
            catalog,
            policy,
            state: ControllerState::Idle,
            has_run: false,
            retry_count: 0,
            next_retry_at: None,
            error: None,
            result: None,
        }
    }

    /// Run the automatic pass, at most once per controller until `retry()`.
    pub fn activate(&mut self, now: Instant) -> SessionStatus {
        if !self.has_run {
            self.has_run = true;
            self.run_pass(now);
        }
        self.status()
    }

    /// Fire the scheduled retry if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> SessionStatus {
        if let Some(due) = self.next_retry_at {
            if now >= due {
                self.next_retry_at = None;
                self.run_pass(now);
            }
        }
        self.status()
    }

    /// Manual retry: reset the once-per-session guard and the retry budget,
    /// drop any pending backoff, and run immediately.
    pub fn retry(&mut self, now: Instant) -> SessionStatus {
        info!("manual catalog retry requested");
        self.next_retry_at = None;
        self.has_run = false;
        self.retry_count = 0;
        self.activate(now)
    }

    /// Cancel any pending retry. Also runs on drop.
    pub fn teardown(&mut self) {
        if self.next_retry_at.take().is_some() {
            info!("pending catalog retry cancelled");
        }
    }

    /// Drive to a terminal state, sleeping through each backoff.
    pub fn run_blocking(&mut self) -> SessionStatus {
        let mut status = self.activate(Instant::now());
        while let Some(due) = self.next_retry_at {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
            status = self.poll(Instant::now());
        }
        status
    }

    fn run_pass(&mut self, now: Instant) {
        self.state = ControllerState::Running;
        self.error = None;

        let verification = self.catalog.verify();
        let outcome = if verification.is_valid() {
            Ok(ReconciliationResult::default())
        } else {
            self.catalog.ensure()
        };

        match outcome {
            Ok(result) if result.success() => {
                info!(
                    created = result.created_count,
                    updated = result.updated_count,
                    "catalog verified"
                );
                self.state = ControllerState::Verified;
                self.result = Some(result);
            }
            Ok(result) => {
                self.error = Some(format!(
                    "{} catalog entries failed to reconcile: {}",
                    result.errors.len(),
                    output::join_bounded(result.error_messages(), 3, 160)
                ));
                self.result = Some(result);
                self.schedule_retry(now);
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.result = None;
                self.schedule_retry(now);
            }
        }
    }

    fn schedule_retry(&mut self, now: Instant) {
        self.state = ControllerState::Errored;
        if self.retry_count < self.policy.max_retries {
            let delay = self.policy.delay_for(self.retry_count);
            let Some(due) = now.checked_add(delay) else {
                warn!(
                    retries = self.retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "catalog retry delay out of range; retries stopped"
                );
                return;
            };
            self.retry_count += 1;
            self.next_retry_at = Some(due);
            warn!(
                attempt = self.retry_count,
                delay_ms = delay.as_millis() as u64,
                error = self.error.as_deref().unwrap_or_default(),
                "catalog pass failed; retry scheduled"
            );
        } else {
            warn!(
                retries = self.retry_count,
                error = self.error.as_deref().unwrap_or_default(),
                "catalog pass failed; retries exhausted"
            );
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            ControllerState::Idle | ControllerState::Running => SessionStatus::Pending,
            ControllerState::Verified => SessionStatus::Verified,
            ControllerState::Errored => SessionStatus::Errored,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SessionStatus::Pending
    }

    pub fn is_verified(&self) -> bool {
        self.status() == SessionStatus::Verified
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&ReconciliationResult> {
        self.result.as_ref()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            is_loading: self.is_loading(),
            is_verified: self.is_verified(),
            error: self.error.clone(),
            result: self.result.clone(),
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn next_retry_at(&self) -> Option<Instant> {
        self.next_retry_at
    }

    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }
}

impl<S: CatalogStore> Drop for RetryController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
