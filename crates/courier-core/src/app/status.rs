//! Status - drain ごとの集計

use serde::{Deserialize, Serialize};

/// Counters for one or more drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainStats {
    pub received: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub deleted: usize,
    pub delete_failures: usize,
    /// Outcomes for which the handler returned `false`.
    pub vetoed: usize,
}

impl DrainStats {
    pub fn merge(&mut self, other: &DrainStats) {
        self.received += other.received;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.deleted += other.deleted;
        self.delete_failures += other.delete_failures;
        self.vetoed += other.vetoed;
    }
}
