use crate::access::{validate_access, AccessError, AccessReview};
use crate::engine::{self, CycleError};
use crate::object::GLOBAL_ANNOTATION;
use crate::store::ObjectStore;
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info};

/// Driver configuration: how often to sync and whether to stop after one
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    pub interval: Duration,
    pub once: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            once: false,
        }
    }
}

/// Ticker-driven loop that runs one sync cycle per interval.
///
/// Cycles never overlap: each one runs to completion on the caller's thread
/// before the next tick is observed.
pub struct Runner<S> {
    store: S,
    interval: Duration,
    once: bool,
    done: Receiver<()>,
    stop: Mutex<Option<Sender<()>>>,
}

impl<S: ObjectStore + AccessReview> Runner<S> {
    pub fn new(store: S, config: RunnerConfig) -> Self {
        let (stop, done) = bounded(0);
        Self {
            store,
            interval: config.interval,
            once: config.once,
            done,
            stop: Mutex::new(Some(stop)),
        }
    }

    /// Startup validation: the permission gate must pass before the first
    /// cycle is allowed to run.
    pub fn init(&self) -> Result<(), AccessError> {
        debug!("initializing");
        validate_access(&self.store)?;
        info!(interval = ?self.interval, "sync interval");
        info!(annotation = GLOBAL_ANNOTATION, "looking for annotated objects");
        Ok(())
    }

    /// Runs the sync loop until the runner is closed.
    ///
    /// A failed cycle is logged and retried on the next tick; in run-once
    /// mode the cycle error is returned instead. Closing the runner ends
    /// the loop after the current tick's wait, never mid-cycle.
    pub fn start(&self) -> Result<(), CycleError> {
        debug!("starting runner");
        let ticker = tick(self.interval);
        let done = self.done.clone();
        loop {
            select! {
                recv(ticker) -> _ => {
                    info!("starting global object sync");
                    match engine::run_cycle(&self.store) {
                        Ok(outcome) => {
                            info!(
                                created = outcome.config_maps.created + outcome.secrets.created,
                                updated = outcome.config_maps.updated + outcome.secrets.updated,
                                deleted = outcome.config_maps.deleted + outcome.secrets.deleted,
                                skipped = outcome.config_maps.skipped + outcome.secrets.skipped,
                                "sync finished"
                            );
                        }
                        Err(err) => {
                            if self.once {
                                return Err(err);
                            }
                            error!(error = %err, "sync cycle failed; retrying on next tick");
                        }
                    }
                    if self.once {
                        debug!("run-once complete, shutting down");
                        self.close();
                    }
                }
                recv(done) -> _ => {
                    debug!("shutdown signal received");
                    return Ok(());
                }
            }
        }
    }

    /// Signals the loop to stop. Safe to call more than once; only the
    /// first call has any effect.
    pub fn close(&self) {
        if let Ok(mut guard) = self.stop.lock() {
            guard.take();
        }
    }
}
