//! Assembles one fresh [`VitalsSnapshot`] per request from the three samplers.

use std::fmt;
use std::sync::Arc;

use crate::config::ThresholdConfig;
use crate::sampler::Sampler;

/// Binary health of a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Okay,
    Fail,
}

impl Health {
    /// A value is okay only while strictly below its threshold.
    ///
    /// Failed samples (negative values) compare as okay; the negative percentage
    /// itself tells the consumer the reading is unusable.
    pub fn assess(percent: i32, threshold: u8) -> Self {
        if percent < i32::from(threshold) {
            Health::Okay
        } else {
            Health::Fail
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::Okay => f.write_str("okay"),
            Health::Fail => f.write_str("fail"),
        }
    }
}

/// A sampled percentage and its health against the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub percent: i32,
    pub health: Health,
}

impl Reading {
    pub fn new(percent: i32, threshold: u8) -> Self {
        Self {
            percent,
            health: Health::assess(percent, threshold),
        }
    }
}

/// Memory, disk and CPU readings taken for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalsSnapshot {
    pub memory: Reading,
    pub disk: Reading,
    pub cpu: Reading,
}

/// Runs the samplers and grades their results.
///
/// [`respond`](Self::respond) blocks for as long as the slowest sampler, about one
/// second with the default CPU sampler.
#[derive(Clone)]
pub struct VitalsResponder {
    thresholds: ThresholdConfig,
    memory: Arc<dyn Sampler>,
    disk: Arc<dyn Sampler>,
    cpu: Arc<dyn Sampler>,
}

impl VitalsResponder {
    pub fn new(
        thresholds: ThresholdConfig,
        memory: impl Sampler + 'static,
        disk: impl Sampler + 'static,
        cpu: impl Sampler + 'static,
    ) -> Self {
        Self {
            thresholds,
            memory: Arc::new(memory),
            disk: Arc::new(disk),
            cpu: Arc::new(cpu),
        }
    }

    /// Samples all three metrics. Failed samples are reported as-is, never retried.
    pub fn respond(&self) -> VitalsSnapshot {
        let memory = self.memory.sample();
        let disk = self.disk.sample();
        let cpu = self.cpu.sample();
        log::trace!("sampled mem={memory} disk={disk} cpu={cpu}");

        VitalsSnapshot {
            memory: Reading::new(memory, self.thresholds.mem),
            disk: Reading::new(disk, self.thresholds.disk),
            cpu: Reading::new(cpu, self.thresholds.cpu),
        }
    }
}

impl fmt::Debug for VitalsResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VitalsResponder")
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{FixedSampler, SAMPLE_FAILED};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn responder(mem: i32, disk: i32, cpu: i32) -> VitalsResponder {
        VitalsResponder::new(
            ThresholdConfig {
                mem: 90,
                disk: 80,
                cpu: 90,
            },
            FixedSampler(mem),
            FixedSampler(disk),
            FixedSampler(cpu),
        )
    }

    #[test]
    fn test_all_okay() {
        let snapshot = responder(37, 15, 2).respond();
        assert_eq!(snapshot.memory, Reading { percent: 37, health: Health::Okay });
        assert_eq!(snapshot.disk, Reading { percent: 15, health: Health::Okay });
        assert_eq!(snapshot.cpu, Reading { percent: 2, health: Health::Okay });
    }

    #[test]
    fn test_all_fail() {
        let snapshot = responder(91, 81, 92).respond();
        assert_eq!(snapshot.memory.health, Health::Fail);
        assert_eq!(snapshot.disk.health, Health::Fail);
        assert_eq!(snapshot.cpu.health, Health::Fail);
    }

    #[test]
    fn test_threshold_boundary_fails() {
        let snapshot = responder(90, 80, 90).respond();
        assert_eq!(snapshot.memory.health, Health::Fail);
        assert_eq!(snapshot.disk.health, Health::Fail);
        assert_eq!(snapshot.cpu.health, Health::Fail);

        let snapshot = responder(89, 79, 89).respond();
        assert_eq!(snapshot.memory.health, Health::Okay);
        assert_eq!(snapshot.disk.health, Health::Okay);
        assert_eq!(snapshot.cpu.health, Health::Okay);
    }

    #[test]
    fn test_failed_sample_reported_as_is() {
        let snapshot = responder(SAMPLE_FAILED, 15, 2).respond();
        assert_eq!(snapshot.memory.percent, -1);
        assert_eq!(snapshot.disk.percent, 15);
    }

    struct CountingSampler(AtomicUsize);

    impl Sampler for CountingSampler {
        fn sample(&self) -> i32 {
            self.0.fetch_add(1, Ordering::SeqCst) as i32
        }
    }

    #[test]
    fn test_samples_fresh_per_call() {
        let responder = VitalsResponder::new(
            ThresholdConfig::default(),
            CountingSampler(AtomicUsize::new(0)),
            FixedSampler(0),
            FixedSampler(0),
        );
        assert_eq!(responder.respond().memory.percent, 0);
        assert_eq!(responder.respond().memory.percent, 1);
        assert_eq!(responder.respond().memory.percent, 2);
    }

    #[test]
    fn test_health_display() {
        assert_eq!(Health::Okay.to_string(), "okay");
        assert_eq!(Health::Fail.to_string(), "fail");
    }
}
