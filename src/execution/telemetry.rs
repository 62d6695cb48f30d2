//! Host load sampling for the worker governor.

use serde::Serialize;

/// One snapshot of host capacity and load
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTelemetry {
    pub logical_cores: usize,
    pub physical_cores: usize,
    /// Global CPU utilization, 0-100
    pub cpu_percent: f32,
    /// Used share of physical memory, 0-100
    pub memory_percent: f32,
    pub total_memory_bytes: u64,
}

impl SystemTelemetry {
    pub fn total_memory_gib(&self) -> f64 {
        self.total_memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Source of telemetry samples; `None` when the host cannot be measured
pub trait TelemetryProbe: Send + Sync {
    fn sample(&self) -> Option<SystemTelemetry>;
}

/// Probe backed by `num_cpus` (core counts) and `sysinfo` (CPU and memory load).
///
/// Sampling blocks for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` because CPU
/// usage is the difference between two refreshes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProbe;

impl TelemetryProbe for SysinfoProbe {
    fn sample(&self) -> Option<SystemTelemetry> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            tracing::debug!("sysinfo does not support this platform");
            return None;
        }

        let mut system = sysinfo::System::new();
        system.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();
        system.refresh_memory();

        let total_memory = system.total_memory();
        if total_memory == 0 {
            tracing::debug!("sysinfo reported no memory, telemetry unavailable");
            return None;
        }

        let telemetry = SystemTelemetry {
            logical_cores: num_cpus::get(),
            physical_cores: num_cpus::get_physical(),
            cpu_percent: system.global_cpu_usage(),
            memory_percent: (system.used_memory() as f64 / total_memory as f64 * 100.0) as f32,
            total_memory_bytes: total_memory,
        };

        tracing::debug!(
            logical_cores = telemetry.logical_cores,
            cpu_percent = telemetry.cpu_percent,
            memory_percent = telemetry.memory_percent,
            "Sampled system telemetry"
        );

        Some(telemetry)
    }
}
