//! Process memory probe backed by sysinfo

use sysinfo::{Pid, System};
use tracing::debug;

/// A point-in-time memory reading against the configured budget.
///
/// Recomputed on every probe, never cached.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReading {
    /// Resident set size of the current process, in bytes.
    pub resident_bytes: u64,
    /// Budget the process must stay under, in bytes.
    pub budget_bytes: u64,
}

impl MemoryReading {
    /// Whether resident usage is below the budget.
    pub fn is_safe(&self) -> bool {
        self.resident_bytes < self.budget_bytes
    }
}

/// Samples resident memory of the current process against a budget.
pub struct MemoryMonitor {
    system: System,
    process_id: Option<Pid>,
    budget_bytes: u64,
}

impl MemoryMonitor {
    /// Create a monitor budgeted at `max_memory_percent` of total system
    /// memory.
    pub fn new(max_memory_percent: f64) -> Self {
        let mut system = System::new_all();
        system.refresh_all();
        let budget_bytes = (system.total_memory() as f64 * (max_memory_percent / 100.0)) as u64;
        debug!(
            budget_bytes,
            max_memory_percent, "memory budget configured"
        );
        Self {
            system,
            process_id: sysinfo::get_current_pid().ok(),
            budget_bytes,
        }
    }

    /// Create a monitor with an explicit budget in bytes.
    pub fn with_budget(budget_bytes: u64) -> Self {
        let mut system = System::new_all();
        system.refresh_all();
        Self {
            system,
            process_id: sysinfo::get_current_pid().ok(),
            budget_bytes,
        }
    }

    /// Configured budget in bytes.
    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    /// Take a fresh reading of resident memory against the budget.
    pub fn reading(&mut self) -> MemoryReading {
        self.system.refresh_all();
        let resident_bytes = self
            .process_id
            .and_then(|pid| self.system.process(pid))
            .map(|process| process.memory())
            .unwrap_or_else(|| self.system.used_memory());
        MemoryReading {
            resident_bytes,
            budget_bytes: self.budget_bytes,
        }
    }
}
