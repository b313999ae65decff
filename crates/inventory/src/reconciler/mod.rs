mod metrics;

pub use self::metrics::{ReconcilerMetrics, RunLabels, RunOutcome};

use prometheus_client::registry::Registry;
use shared::{
    cache::{CartStore, ReservationCounter},
    errors::{CacheError, ServiceError},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};
use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub carts_seen: usize,
    pub counters_written: usize,
    pub counters_deleted: usize,
    /// Carts whose stored value could not be decoded.
    pub carts_skipped: usize,
    /// Set when shutdown cut the run short.
    pub interrupted: bool,
}

/// Rebuilds the per-ticket-type reservation counters from the live carts.
///
/// Each run replaces every counter with a fresh snapshot and drops counters
/// for types no live cart holds any more, which is how reservations of
/// silently expired carts are released. Runs never overlap: the loop is one
/// task and a slow run delays the next tick instead of queueing it.
pub struct ReservationReconciler {
    carts: CartStore,
    counter: ReservationCounter,
    interval: Duration,
    metrics: ReconcilerMetrics,
    state_tx: watch::Sender<ReconcilerState>,
}

impl ReservationReconciler {
    pub fn new(
        carts: CartStore,
        counter: ReservationCounter,
        interval: Duration,
        registry: &mut Registry,
    ) -> Self {
        let metrics = ReconcilerMetrics::new();
        metrics.register(registry);

        let (state_tx, _) = watch::channel(ReconcilerState::Idle);

        Self {
            carts,
            counter,
            interval,
            metrics,
            state_tx,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ReconcilerState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ReconcilerState {
        *self.state_tx.borrow()
    }

    /// One full reconciliation pass.
    ///
    /// Shutdown is checked between carts and between counter writes. A run
    /// stopped during the cart scan writes nothing, so a partial snapshot
    /// never understates reservations. A cart that cannot be decoded is
    /// skipped and counted; a store failure aborts the run.
    pub async fn run_once(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<ReconciliationReport, ServiceError> {
        let mut report = ReconciliationReport::default();
        let mut totals: BTreeMap<i32, u64> = BTreeMap::new();

        let customers = self.carts.list_customers().await?;
        debug!("Reconciling {} live carts", customers.len());

        for customer_email in &customers {
            if *shutdown.borrow() {
                report.interrupted = true;
                return Ok(report);
            }

            let cart = match self.carts.peek_cart(customer_email).await {
                Ok(Some(cart)) => cart,
                // expired between listing and loading
                Ok(None) => continue,
                Err(ServiceError::Cache(CacheError::Corrupt { key, reason })) => {
                    warn!("⚠️ Skipping undecodable cart '{key}': {reason}");
                    report.carts_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            report.carts_seen += 1;

            for (ticket_type_id, quantity) in cart.new_ticket_reservations {
                let total = totals.entry(ticket_type_id).or_insert(0);
                *total = total.saturating_add(u64::from(quantity));
            }
        }

        totals.retain(|_, total| *total > 0);

        for (ticket_type_id, total) in &totals {
            if *shutdown.borrow() {
                report.interrupted = true;
                return Ok(report);
            }

            self.counter.set(*ticket_type_id, *total).await?;
            self.metrics.counters_written.inc();
            report.counters_written += 1;
        }

        let live_types: BTreeSet<i32> = totals.keys().copied().collect();

        for ticket_type_id in self.counter.list_ticket_type_ids().await? {
            if live_types.contains(&ticket_type_id) {
                continue;
            }

            if *shutdown.borrow() {
                report.interrupted = true;
                return Ok(report);
            }

            self.counter.delete(ticket_type_id).await?;
            self.metrics.counters_deleted.inc();
            report.counters_deleted += 1;
            debug!("Removed stale reservation counter for ticket type {ticket_type_id}");
        }

        Ok(report)
    }

    async fn tick(&self, shutdown: &watch::Receiver<bool>) {
        self.state_tx.send_replace(ReconcilerState::Running);
        let start = Instant::now();

        let outcome = match self.run_once(shutdown).await {
            Ok(report) if report.interrupted => {
                warn!("⚠️ Reconciliation interrupted by shutdown: {report:?}");
                RunOutcome::Interrupted
            }
            Ok(report) => {
                info!(
                    carts_seen = report.carts_seen,
                    carts_skipped = report.carts_skipped,
                    counters_written = report.counters_written,
                    counters_deleted = report.counters_deleted,
                    "✅ Reconciliation run completed"
                );
                RunOutcome::Success
            }
            Err(e) => {
                error!("❌ Reconciliation run failed, retrying next tick: {e}");
                RunOutcome::Failure
            }
        };

        self.metrics
            .record_run(outcome, start.elapsed().as_secs_f64());
        self.state_tx.send_replace(ReconcilerState::Idle);
    }

    /// Runs until `shutdown_rx` flips to `true` or its sender is dropped.
    pub async fn start_with_shutdown(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "🔁 Reconciliation loop started, interval {:?}",
            self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(&shutdown_rx).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown sender dropped, stopping reconciliation loop");
                        break;
                    }
                }
            }
        }

        info!("🛑 Reconciliation loop stopped");
    }
}
