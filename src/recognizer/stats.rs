//! Loop counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::cycle::CycleReport;

/// Running totals, updated by the loop task and readable from anywhere.
#[derive(Debug, Default)]
pub struct LoopStats {
    cycles: AtomicU64,
    delivered: AtomicU64,
    no_result: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`LoopStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub delivered: u64,
    pub no_result: u64,
    pub timed_out: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl LoopStats {
    pub fn record(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        let counter = match report {
            CycleReport::Delivered(_) => &self.delivered,
            CycleReport::NoResult => &self.no_result,
            CycleReport::TimedOut => &self.timed_out,
            CycleReport::CaptureFailed | CycleReport::ClassifyFailed => &self.failed,
            CycleReport::Busy => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            no_result: self.no_result.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cycles: {} delivered, {} no result, {} timed out, {} failed, {} skipped",
            self.cycles, self.delivered, self.no_result, self.timed_out, self.failed, self.skipped
        )
    }
}
