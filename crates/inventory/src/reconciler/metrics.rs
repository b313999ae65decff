use prometheus_client::metrics::{counter::Counter, family::Family, histogram::Histogram};
use prometheus_client::registry::Registry;
use prometheus_client_derive_encode::{EncodeLabelSet, EncodeLabelValue};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum RunOutcome {
    Success,
    Failure,
    Interrupted,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RunLabels {
    pub outcome: RunOutcome,
}

#[derive(Clone, Debug)]
pub struct ReconcilerMetrics {
    pub runs: Family<RunLabels, Counter>,
    pub run_duration: Histogram,
    pub counters_written: Counter,
    pub counters_deleted: Counter,
}

impl Default for ReconcilerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcilerMetrics {
    pub fn new() -> Self {
        Self {
            runs: Family::default(),
            run_duration: Histogram::new(vec![
                0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0,
            ]),
            counters_written: Counter::default(),
            counters_deleted: Counter::default(),
        }
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "reconciliation_runs",
            "Reconciliation runs by outcome",
            self.runs.clone(),
        );
        registry.register(
            "reconciliation_run_duration",
            "Histogram of reconciliation run durations in seconds",
            self.run_duration.clone(),
        );
        registry.register(
            "reconciliation_counters_written",
            "Reservation counters overwritten by reconciliation",
            self.counters_written.clone(),
        );
        registry.register(
            "reconciliation_counters_deleted",
            "Stale reservation counters removed by reconciliation",
            self.counters_deleted.clone(),
        );
    }

    pub fn record_run(&self, outcome: RunOutcome, duration_secs: f64) {
        self.runs.get_or_create(&RunLabels { outcome }).inc();
        self.run_duration.observe(duration_secs);
    }
}
