//! # Host Statistics
//!
//! Samples CPU load, memory use and network totals for the stats bar.
//! The UI loop calls [`StatsSampler::sample`] on its one-second clock tick
//! and hands the result to `update()` as `Action::StatsSampled`.
//!
//! CPU usage is measured between two refreshes, so the very first sample
//! reads 0%.

use log::debug;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::core::state::SystemStats;

pub struct StatsSampler {
    system: System,
    networks: Networks,
}

impl StatsSampler {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let networks = Networks::new_with_refreshed_list();
        debug!("Stats sampler watching {} interfaces", networks.list().len());
        Self { system, networks }
    }

    pub fn sample(&mut self) -> SystemStats {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.networks.refresh();

        let (bytes_sent, bytes_received) = self
            .networks
            .list()
            .values()
            .fold((0u64, 0u64), |(sent, received), data| {
                (
                    sent.saturating_add(data.total_transmitted()),
                    received.saturating_add(data.total_received()),
                )
            });

        SystemStats {
            cpu_percent: self.system.global_cpu_usage(),
            memory_percent: percent(self.system.used_memory(), self.system.total_memory()),
            bytes_sent,
            bytes_received,
        }
    }
}

impl Default for StatsSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(8, 8), 100.0);
    }

    #[test]
    fn test_sample_is_in_range() {
        let mut sampler = StatsSampler::new();
        let first = sampler.sample();
        let second = sampler.sample();
        for stats in [first, second] {
            assert!((0.0..=100.0).contains(&stats.cpu_percent));
            assert!((0.0..=100.0).contains(&stats.memory_percent));
        }
        // Totals since boot only grow.
        assert!(second.bytes_sent >= first.bytes_sent);
        assert!(second.bytes_received >= first.bytes_received);
    }
}
