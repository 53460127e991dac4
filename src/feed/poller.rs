//! Position poller - periodic fetch loop with a cancelable handle.
//!
//! The poller maintains a live, eventually-consistent view of positions for
//! a caller-selected set of vehicles. It is the only component in the crate
//! that performs background work:
//!
//! - `start()` spawns an async task; the first fetch happens immediately,
//!   then every poll interval.
//! - At most one fetch is in flight per subscription. A tick that arrives
//!   while a fetch is outstanding is skipped, never queued.
//! - A failed fetch retains the last-known positions, emits an advisory
//!   [`PollerEvent::FetchFailed`], and the loop retries on the next tick
//!   (with exponential backoff after consecutive failures).
//! - `stop()` is race-free: once it returns, no further events are
//!   broadcast and the live view no longer changes.
//!
//! # Stale-result discard
//!
//! Changing the tracked selection while a fetch is in flight must not let
//! the late response resurrect positions for deselected vehicles. Every
//! fetch is tagged with the request generation active at its start; the
//! result is applied only if the generation is still current when the
//! fetch resolves. Selection changes bump the generation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::client::{validate_record, PositionFeed};
use super::config::{calculate_backoff, PollerConfig};
use super::error::FeedError;
use super::types::{
    PollerEvent, PositionSample, RawPosition, VehicleId, VehicleSelection, VehicleSnapshot,
    VehicleStatus,
};

/// Commands the handle can send to a running poll loop.
#[derive(Debug)]
enum PollerCommand {
    SetInterval(Duration),
    SetSelection(VehicleSelection),
}

/// Entry point for starting poll subscriptions.
pub struct PositionPoller;

impl PositionPoller {
    /// Begin periodic fetching for `selection`.
    ///
    /// The first fetch happens immediately; subsequent fetches every
    /// `config.poll_interval`. Returns a handle that owns the subscription.
    pub fn start<F>(feed: F, selection: VehicleSelection, config: PollerConfig) -> PollerHandle
    where
        F: PositionFeed + 'static,
    {
        let live = Arc::new(DashMap::new());
        let (event_tx, _) = broadcast::channel(config.channel_capacity);
        let (command_tx, command_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let poll_loop = PollLoop {
            feed: Arc::new(feed),
            selection,
            generation: 0,
            poll_interval: config.poll_interval,
            interval_dirty: false,
            consecutive_errors: 0,
            live: Arc::clone(&live),
            event_tx: event_tx.clone(),
            command_rx,
        };

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            poll_loop.run(task_cancel).await;
        });

        PollerHandle {
            command_tx,
            cancel,
            task,
            live,
            event_tx,
        }
    }
}

/// Handle to a running poll subscription.
///
/// Dropping the handle without calling [`stop`](Self::stop) also terminates
/// the loop (the command channel closes), but only `stop` guarantees the
/// task has fully finished before returning.
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollerCommand>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    live: Arc<DashMap<VehicleId, VehicleSnapshot>>,
    event_tx: broadcast::Sender<PollerEvent>,
}

impl PollerHandle {
    /// Replace the poll schedule. The currently in-flight fetch (if any) is
    /// not interrupted; the new interval takes effect from the next fetch.
    pub async fn update_interval(&self, interval: Duration) -> Result<(), FeedError> {
        self.command_tx
            .send(PollerCommand::SetInterval(interval))
            .await
            .map_err(|_| FeedError::ChannelClosed)
    }

    /// Replace the tracked vehicle selection.
    ///
    /// Bumps the request generation, so an in-flight fetch started under
    /// the old selection is discarded when it resolves. Live entries for
    /// vehicles outside the new selection are removed.
    pub async fn update_selection(&self, selection: VehicleSelection) -> Result<(), FeedError> {
        self.command_tx
            .send(PollerCommand::SetSelection(selection))
            .await
            .map_err(|_| FeedError::ChannelClosed)
    }

    /// Subscribe to position batches and fetch-failure advisories.
    pub fn subscribe(&self) -> broadcast::Receiver<PollerEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of the last-known state for every tracked vehicle.
    pub fn positions(&self) -> Vec<VehicleSnapshot> {
        self.live.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Last-known state for one vehicle, if any.
    pub fn position_of(&self, vehicle: &VehicleId) -> Option<VehicleSnapshot> {
        self.live.get(vehicle).map(|entry| entry.value().clone())
    }

    /// Cancel all pending and future fetches.
    ///
    /// Waits for the poll task to finish; after this returns, no further
    /// events fire and the live view no longer changes.
    pub async fn stop(self) {
        self.cancel.cancel();
        match self.task.await {
            Ok(()) => tracing::debug!("Position poller shut down cleanly"),
            Err(e) => tracing::error!("Position poller task panicked: {}", e),
        }
    }
}

/// The poll loop state, owned by the spawned task.
struct PollLoop<F> {
    feed: Arc<F>,
    selection: VehicleSelection,
    /// Request generation, bumped on every selection change.
    generation: u64,
    poll_interval: Duration,
    /// Set when the interval changed and the ticker needs rebuilding.
    interval_dirty: bool,
    consecutive_errors: u32,
    live: Arc<DashMap<VehicleId, VehicleSnapshot>>,
    event_tx: broadcast::Sender<PollerEvent>,
    command_rx: mpsc::Receiver<PollerCommand>,
}

impl<F: PositionFeed + 'static> PollLoop<F> {
    async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs_f64(),
            "Position poller started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.interval_dirty {
                self.interval_dirty = false;
                ticker = tokio::time::interval_at(
                    Instant::now() + self.poll_interval,
                    self.poll_interval,
                );
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.apply_command(cmd),
                    None => {
                        tracing::debug!("Poller handle dropped, stopping");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if self.consecutive_errors > 0 {
                        let backoff = calculate_backoff(self.consecutive_errors);
                        tracing::debug!(
                            backoff_secs = backoff.as_secs(),
                            consecutive_errors = self.consecutive_errors,
                            "Backing off after fetch errors"
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                    if !self.poll_once(&cancel).await {
                        break;
                    }
                }
            }
        }

        tracing::info!("Position poller stopped");
    }

    /// Run one fetch, processing commands while it is in flight.
    ///
    /// Returns false when the loop should stop.
    async fn poll_once(&mut self, cancel: &CancellationToken) -> bool {
        let generation = self.generation;
        let fetch = {
            let feed = Arc::clone(&self.feed);
            let selection = self.selection.clone();
            async move { feed.fetch_positions(&selection).await }
        };
        tokio::pin!(fetch);

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.apply_command(cmd),
                    None => {
                        tracing::debug!("Poller handle dropped, stopping");
                        return false;
                    }
                },
                result = &mut fetch => break result,
            }
        };

        match result {
            Ok(records) => {
                if generation != self.generation {
                    // Selection changed while the fetch was in flight.
                    tracing::trace!(
                        fetched_generation = generation,
                        current_generation = self.generation,
                        "Discarding stale fetch result"
                    );
                    return true;
                }
                self.consecutive_errors = 0;
                let batch = sanitize_batch(&records, &self.selection, &self.live);
                if !batch.is_empty() {
                    let _ = self.event_tx.send(PollerEvent::Batch(batch));
                }
            }
            Err(e) => {
                self.consecutive_errors += 1;
                tracing::warn!(
                    error = %e,
                    consecutive_errors = self.consecutive_errors,
                    "Position fetch failed; retaining last-known positions"
                );
                let _ = self.event_tx.send(PollerEvent::FetchFailed {
                    consecutive_errors: self.consecutive_errors,
                    message: e.to_string(),
                });
            }
        }

        true
    }

    fn apply_command(&mut self, cmd: PollerCommand) {
        match cmd {
            PollerCommand::SetInterval(interval) => {
                tracing::info!(
                    poll_interval_secs = interval.as_secs_f64(),
                    "Poll interval updated"
                );
                self.poll_interval = interval;
                self.interval_dirty = true;
            }
            PollerCommand::SetSelection(selection) => {
                self.generation += 1;
                tracing::info!(generation = self.generation, "Vehicle selection updated");
                self.live.retain(|id, _| selection.includes(id));
                self.selection = selection;
            }
        }
    }
}

/// Validate a raw batch and fold it into the live view.
///
/// Returns the samples that should reach zone evaluation: validated,
/// within the current selection, timestamp-monotonic per vehicle, and not
/// decommissioned. Invalid records are dropped with a warning; they are
/// never retried and never reach downstream consumers.
fn sanitize_batch(
    records: &[RawPosition],
    selection: &VehicleSelection,
    live: &DashMap<VehicleId, VehicleSnapshot>,
) -> Vec<PositionSample> {
    let mut batch = Vec::with_capacity(records.len());

    for raw in records {
        let (sample, status) = match validate_record(raw) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping invalid position record");
                continue;
            }
        };

        if !selection.includes(&sample.vehicle) {
            tracing::trace!(vehicle = %sample.vehicle, "Record outside selection, skipping");
            continue;
        }

        let regressed = live
            .get(&sample.vehicle)
            .is_some_and(|prev| sample.timestamp < prev.sample.timestamp);
        if regressed {
            let e = FeedError::OutOfOrderSample {
                vehicle: sample.vehicle.to_string(),
                timestamp: sample.timestamp.to_rfc3339(),
                last_known: live
                    .get(&sample.vehicle)
                    .map(|prev| prev.sample.timestamp.to_rfc3339())
                    .unwrap_or_default(),
            };
            tracing::warn!(error = %e, "Dropping out-of-order position record");
            continue;
        }

        live.insert(
            sample.vehicle.clone(),
            VehicleSnapshot {
                sample: sample.clone(),
                status,
            },
        );

        // Decommissioned vehicles keep a last-known snapshot but are
        // excluded from active tracking downstream.
        if status != VehicleStatus::Decommissioned {
            batch.push(sample);
        }
    }

    batch
}
