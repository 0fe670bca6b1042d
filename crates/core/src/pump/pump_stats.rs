use std::collections::BTreeMap;
use std::fmt;

use crate::detection::domain::category::Category;

/// Counters accumulated over a pump's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub ticks: u64,
    pub passes_started: u64,
    pub passes_completed: u64,
    pub dropped_busy: u64,
    pub dropped_paused: u64,
    pub dropped_no_frame: u64,
    pub failures: BTreeMap<Category, u64>,
}

impl PumpStats {
    pub fn dropped(&self) -> u64 {
        self.dropped_busy + self.dropped_paused + self.dropped_no_frame
    }

    pub fn failures_for(&self, category: Category) -> u64 {
        self.failures.get(&category).copied().unwrap_or(0)
    }

    pub(crate) fn record_failure(&mut self, category: Category) {
        *self.failures.entry(category).or_default() += 1;
    }
}

impl fmt::Display for PumpStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} passes ({} completed), dropped {} busy / {} paused / {} no frame",
            self.ticks,
            self.passes_started,
            self.passes_completed,
            self.dropped_busy,
            self.dropped_paused,
            self.dropped_no_frame
        )?;
        for (category, count) in &self.failures {
            write!(f, ", {count} {category} failures")?;
        }
        Ok(())
    }
}
