/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Periodic driver for processing passes.
//!
//! The scheduler is either stopped or running. While running, a single driver
//! task waits for `processing_interval` (or a nudge from
//! [`QueueScheduler::schedule_processing`]), runs one pass, and waits again.
//!
//! ```text
//!            start()                     interval elapsed / nudge
//! stopped ────────────► running ◄──────────────────────────────┐
//!    ▲                     │                                   │
//!    └──── stop() ─────────┴──────► run pass ──────────────────┘
//! ```
//!
//! `stop()` never cancels a pass that is already in flight; the driver checks
//! the stop flag after the pass and exits instead of waiting again. Passes
//! never overlap, even across a stop/start cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

use crate::audit;
use crate::config::NotifierConfig;
use crate::processor::ProcessingPass;

/// One running driver task and its signals.
struct Driver {
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

struct Inner {
    pass: Arc<dyn ProcessingPass>,
    interval: Duration,
    driver: Mutex<Option<Driver>>,
    // Serializes passes across drivers.
    pass_lock: Arc<tokio::sync::Mutex<()>>,
}

/// Drives processing passes on a fixed interval.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct QueueScheduler {
    inner: Arc<Inner>,
}

impl QueueScheduler {
    /// Creates a stopped scheduler using the configured processing interval.
    pub fn new(pass: Arc<dyn ProcessingPass>, config: &NotifierConfig) -> Self {
        Self::with_interval(pass, config.processing_interval())
    }

    /// Creates a stopped scheduler with an explicit interval.
    pub fn with_interval(pass: Arc<dyn ProcessingPass>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                pass,
                interval,
                driver: Mutex::new(None),
                pass_lock: Arc::new(tokio::sync::Mutex::new(())),
            }),
        }
    }

    /// Starts polling. The first pass runs one interval from now.
    ///
    /// No-op while already running. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self) {
        let mut driver = self.inner.driver.lock();
        if driver.is_some() {
            return;
        }

        let stopped = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let handle = tokio::spawn(drive(
            Arc::clone(&self.inner.pass),
            Arc::clone(&self.inner.pass_lock),
            self.inner.interval,
            Arc::clone(&stopped),
            Arc::clone(&wake),
        )
        .in_current_span());

        *driver = Some(Driver {
            stopped,
            wake,
            handle,
        });
        info!(
            interval_ms = self.inner.interval.as_millis() as u64,
            "Notification scheduler started"
        );
    }

    /// Runs a pass at the next opportunity instead of waiting out the
    /// interval.
    ///
    /// Has no effect while stopped. A nudge during an in-flight pass runs
    /// another pass as soon as that one finishes.
    pub fn schedule_processing(&self) {
        if let Some(driver) = self.inner.driver.lock().as_ref() {
            debug!("Processing pass requested");
            driver.wake.notify_one();
        }
    }

    /// Stops polling. Idempotent.
    ///
    /// A pass already in flight runs to completion; no further pass starts.
    pub fn stop(&self) {
        if let Some(driver) = self.take_driver() {
            drop(driver.handle);
            info!("Notification scheduler stopped");
        }
    }

    /// Stops polling and waits for any in-flight pass to finish.
    pub async fn shutdown(&self) {
        if let Some(driver) = self.take_driver() {
            if let Err(e) = driver.handle.await {
                error!(error = %e, "Scheduler driver task failed");
            }
            info!("Notification scheduler shut down");
        }
    }

    /// Whether the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.inner.driver.lock().is_some()
    }

    fn take_driver(&self) -> Option<Driver> {
        let driver = self.inner.driver.lock().take()?;
        driver.stopped.store(true, Ordering::SeqCst);
        driver.wake.notify_one();
        Some(driver)
    }
}

async fn drive(
    pass: Arc<dyn ProcessingPass>,
    pass_lock: Arc<tokio::sync::Mutex<()>>,
    interval: Duration,
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = wake.notified() => {}
        }

        if stopped.load(Ordering::SeqCst) {
            break;
        }
        // A previous driver may still be finishing its pass.
        let _guard = pass_lock.lock().await;
        if stopped.load(Ordering::SeqCst) {
            break;
        }

        let pass = Arc::clone(&pass);
        match tokio::spawn(async move { pass.run_pass().await }.in_current_span()).await {
            Ok(Ok(summary)) if summary.due > 0 => {
                debug!(
                    due = summary.due,
                    delivered = summary.delivered,
                    rescheduled = summary.rescheduled,
                    abandoned = summary.abandoned,
                    failed = summary.failed,
                    "Processing pass finished"
                );
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => audit::log_pass_failed(&e.to_string()),
            Err(e) => audit::log_pass_failed(&format!("pass task failed: {}", e)),
        }

        if stopped.load(Ordering::SeqCst) {
            break;
        }
    }
    debug!("Scheduler driver exited");
}
