//! Soak test profiles: configuration for long-running fault-injection and
//! recovery cycles, kept separate from unit-scale property tests so a CI
//! lane can opt into the expensive ones explicitly.

use std::time::Duration;

/// One soak profile: how long to run, how often to inject a fault, and the
/// recovery budget each injected fault must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoakProfile {
    pub name: &'static str,
    pub duration: Duration,
    pub fault_injection_interval: Duration,
    pub recovery_budget: Duration,
    pub max_partitions: usize,
}

impl SoakProfile {
    /// Number of fault-injection cycles this profile runs end to end.
    #[must_use]
    pub fn cycle_count(&self) -> u64 {
        if self.fault_injection_interval.is_zero() {
            0
        } else {
            self.duration.as_millis() as u64 / self.fault_injection_interval.as_millis().max(1) as u64
        }
    }
}

/// Quick profile for local runs: a handful of cycles, tight budget.
#[must_use]
pub const fn smoke_profile() -> SoakProfile {
    SoakProfile {
        name: "smoke",
        duration: Duration::from_secs(10),
        fault_injection_interval: Duration::from_secs(2),
        recovery_budget: Duration::from_secs(1),
        max_partitions: 4,
    }
}

/// Extended profile intended for nightly/CI soak lanes.
#[must_use]
pub const fn nightly_profile() -> SoakProfile {
    SoakProfile {
        name: "nightly",
        duration: Duration::from_secs(3600),
        fault_injection_interval: Duration::from_secs(30),
        recovery_budget: Duration::from_secs(10),
        max_partitions: 16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_profile_runs_a_handful_of_cycles() {
        let profile = smoke_profile();
        assert_eq!(profile.cycle_count(), 5);
    }

    #[test]
    fn nightly_profile_covers_more_partitions_than_smoke() {
        assert!(nightly_profile().max_partitions > smoke_profile().max_partitions);
    }
}
