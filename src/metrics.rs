// Usage telemetry module
//
// Provides a best-effort memory and operation tracker for a single load session.
// Nothing in here gates correctness; the loader only records into it and reports it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;

/// Source of a platform memory reading.
///
/// Implementations return the resident memory of the current process in MiB,
/// or `None` when the platform offers no usable reading.
#[cfg_attr(test, mockall::automock)]
pub trait MemoryProbe: Send + Sync {
    fn resident_mib(&self) -> Option<u64>;
}

/// Reads `VmRSS` from `/proc/self/status`.
///
/// Only meaningful on Linux; everywhere else it reports `None` and the tracker
/// falls back to its synthetic estimate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatusProbe;

impl MemoryProbe for ProcStatusProbe {
    fn resident_mib(&self) -> Option<u64> {
        if !cfg!(target_os = "linux") {
            return None;
        }

        let status = fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss_kib(&status).map(|kib| (kib + 512) / 1024)
    }
}

/// Extract the `VmRSS` value (in KiB) from the contents of `/proc/<pid>/status`.
fn parse_vm_rss_kib(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// One entry of the checkpoint log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub at: DateTime<Utc>,
    pub memory: u64,
    pub operations: u64,
}

/// Point-in-time view of the tracker.
///
/// All memory figures share one unit (MiB when a probe is available,
/// otherwise the synthetic operation-derived estimate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub start_memory: u64,
    pub current_memory: u64,
    pub peak_memory: u64,
    pub operations: u64,
    pub checkpoints: usize,
}

/// Session-scoped usage tracker
///
/// Collects an approximate memory signal and an operation count while a
/// configuration is being loaded. The estimate is non-authoritative: it uses
/// the platform probe when one answers, otherwise `round(operations * 0.1)`.
///
/// `peak` never decreases between resets and is always at least every sample
/// taken since the last reset.
pub struct UsageTracker {
    probe: Box<dyn MemoryProbe>,
    start_memory: u64,
    peak_memory: u64,
    operations: u64,
    checkpoints: Vec<CheckpointRecord>,
}

impl UsageTracker {
    /// Create a tracker backed by the platform probe.
    pub fn new() -> Self {
        Self::with_probe(Box::new(ProcStatusProbe))
    }

    /// Create a tracker backed by a custom probe.
    pub fn with_probe(probe: Box<dyn MemoryProbe>) -> Self {
        let mut tracker = Self {
            probe,
            start_memory: 0,
            peak_memory: 0,
            operations: 0,
            checkpoints: Vec::new(),
        };
        tracker.reset();
        tracker
    }

    /// Start a fresh session: clear counters and take the baseline sample.
    pub fn reset(&mut self) {
        self.operations = 0;
        self.checkpoints.clear();
        self.start_memory = self.sample();
        self.peak_memory = self.start_memory;
    }

    /// Record one operation.
    pub fn track(&mut self, operation: &str) {
        self.operations += 1;
        let memory = self.sample();
        self.raise_peak(memory);
        tracing::trace!(operation, memory, operations = self.operations, "tracked");
    }

    /// Append a timestamped sample to the checkpoint log.
    pub fn checkpoint(&mut self) {
        let memory = self.sample();
        self.checkpoints.push(CheckpointRecord {
            at: Utc::now(),
            memory,
            operations: self.operations,
        });
        self.raise_peak(memory);
    }

    /// Best-effort memory estimate.
    pub fn sample(&self) -> u64 {
        self.probe
            .resident_mib()
            .unwrap_or_else(|| (self.operations as f64 * 0.1).round() as u64)
    }

    /// Current statistics. Takes a fresh sample for `current_memory`.
    pub fn snapshot(&self) -> UsageSnapshot {
        let current_memory = self.sample();
        UsageSnapshot {
            start_memory: self.start_memory,
            current_memory,
            // A reading taken here may exceed the recorded peak
            peak_memory: self.peak_memory.max(current_memory),
            operations: self.operations,
            checkpoints: self.checkpoints.len(),
        }
    }

    /// The checkpoint log of the current session.
    pub fn checkpoint_log(&self) -> &[CheckpointRecord] {
        &self.checkpoints
    }

    /// Log a telemetry summary
    pub fn log_summary(&self) {
        let stats = self.snapshot();
        tracing::info!("=== Load Usage Summary ===");
        tracing::info!(
            "Memory: start {}, current {}, peak {}",
            stats.start_memory,
            stats.current_memory,
            stats.peak_memory
        );
        tracing::info!(
            "Operations: {}, checkpoints: {}",
            stats.operations,
            stats.checkpoints
        );
    }

    fn raise_peak(&mut self, memory: u64) {
        if memory > self.peak_memory {
            self.peak_memory = memory;
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("start_memory", &self.start_memory)
            .field("peak_memory", &self.peak_memory)
            .field("operations", &self.operations)
            .field("checkpoints", &self.checkpoints.len())
            .finish()
    }
}
