//! Worker-count decision for a run.
//!
//! `optimal_workers` is a pure function of the workload size, the requested
//! count and one telemetry sample, so every rule is testable without a host.

use super::telemetry::SystemTelemetry;
use crate::config::Thresholds;
use serde::Serialize;

/// Host class by logical core count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HostTier {
    Low,
    Mid,
    High,
}

impl HostTier {
    pub fn from_cores(logical_cores: usize) -> Self {
        match logical_cores {
            0..=4 => HostTier::Low,
            5..=8 => HostTier::Mid,
            _ => HostTier::High,
        }
    }

    /// Tier ceiling, never above twice the logical core count
    pub fn worker_cap(self, logical_cores: usize) -> usize {
        let tier_cap = match self {
            HostTier::Low => 4,
            HostTier::Mid => 8,
            HostTier::High => 16,
        };
        tier_cap.min(logical_cores.max(1) * 2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPlan {
    pub requested: usize,
    pub workers: usize,
    /// Human readable trace of every rule that changed the count
    pub decisions: Vec<String>,
}

impl WorkerPlan {
    /// Whether the governor lowered the requested count
    pub fn was_reduced(&self) -> bool {
        self.workers < self.requested
    }

    /// Percentage of the requested workers that was cut
    pub fn reduction_percent(&self) -> usize {
        if self.requested == 0 || !self.was_reduced() {
            return 0;
        }
        (self.requested - self.workers) * 100 / self.requested
    }
}

pub fn optimal_workers(
    total_files: usize,
    requested: usize,
    telemetry: Option<&SystemTelemetry>,
    optimization_enabled: bool,
    thresholds: &Thresholds,
) -> WorkerPlan {
    let ceiling = thresholds.max_workers.max(1);
    let mut decisions = Vec::new();

    let telemetry = match telemetry {
        Some(t) if optimization_enabled => t,
        _ => {
            let workers = requested.clamp(1, ceiling);
            if workers != requested {
                decisions.push(format!("clamped {} -> {}", requested, workers));
            }
            return WorkerPlan {
                requested,
                workers,
                decisions,
            };
        }
    };

    let mut workers = requested.max(1);

    if total_files < workers * 2 {
        let reduced = (total_files / 2).max(1);
        decisions.push(format!("{} files, {} -> {}", total_files, workers, reduced));
        workers = reduced;
    }

    let tier = HostTier::from_cores(telemetry.logical_cores);
    let cap = tier.worker_cap(telemetry.logical_cores);
    if workers > cap {
        decisions.push(format!(
            "{:?} tier ({} cores), {} -> {}",
            tier, telemetry.logical_cores, workers, cap
        ));
        workers = cap;
    }

    if telemetry.cpu_percent > thresholds.cpu_busy_percent {
        let reduced = (workers * thresholds.cpu_keep_percent / 100).max(1);
        decisions.push(format!(
            "CPU {:.0}%, {} -> {}",
            telemetry.cpu_percent, workers, reduced
        ));
        workers = reduced;
    }

    if telemetry.memory_percent > thresholds.memory_busy_percent {
        let reduced = (workers * thresholds.memory_keep_percent / 100).max(1);
        decisions.push(format!(
            "memory {:.0}%, {} -> {}",
            telemetry.memory_percent, workers, reduced
        ));
        workers = reduced;
    }

    if telemetry.total_memory_bytes < thresholds.low_memory_bytes
        && workers > thresholds.low_memory_max_workers
    {
        decisions.push(format!(
            "{:.1} GiB RAM, {} -> {}",
            telemetry.total_memory_gib(),
            workers,
            thresholds.low_memory_max_workers
        ));
        workers = thresholds.low_memory_max_workers;
    }

    let workers = workers.clamp(1, ceiling);

    tracing::info!(
        requested,
        workers,
        total_files,
        cores = telemetry.logical_cores,
        cpu_percent = telemetry.cpu_percent,
        memory_percent = telemetry.memory_percent,
        "Worker count decided"
    );

    WorkerPlan {
        requested,
        workers,
        decisions,
    }
}
