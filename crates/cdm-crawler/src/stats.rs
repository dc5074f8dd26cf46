use std::fmt;
use std::ops::AddAssign;

/// Result of making sure one artifact is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Present before the run needed it
    Cached,
    Written,
    /// ContentDM answered "Requested item not found", nothing was written
    NotFound,
    /// Transport failure or unusable payload, nothing was written
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub written: usize,
    pub cached: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl ScrapeStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Cached => self.cached += 1,
            Outcome::Written => self.written += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

impl AddAssign for ScrapeStats {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.cached += other.cached;
        self.not_found += other.not_found;
        self.failed += other.failed;
    }
}

impl fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} cached, {} not found, {} failed",
            self.written, self.cached, self.not_found, self.failed
        )
    }
}
