//! Conformance run results.

use std::fmt;
use std::time::Duration;

/// Outcome of a single conformance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The backend satisfied the property.
    Passed,
    /// The check does not apply to this backend.
    Skipped(&'static str),
    /// The backend violated the property.
    Failed(String),
}

/// A named check and how it went.
#[derive(Debug, Clone)]
pub struct CheckRecord {
    /// Check name.
    pub name: &'static str,
    /// Outcome.
    pub outcome: CheckOutcome,
    /// Wall time spent in the check.
    pub duration: Duration,
}

/// Result of a full conformance run.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    /// Every check in execution order.
    pub checks: Vec<CheckRecord>,
}

impl ConformanceReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn record(&mut self, name: &'static str, outcome: CheckOutcome, duration: Duration) {
        self.checks.push(CheckRecord {
            name,
            outcome,
            duration,
        });
    }

    /// Number of passed checks.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Passed))
    }

    /// Number of skipped checks.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Skipped(_)))
    }

    /// Number of failed checks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Failed(_)))
    }

    /// True when no check failed.
    #[must_use]
    pub fn is_conformant(&self) -> bool {
        self.failed() == 0
    }

    /// Looks up the outcome of a check by name.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.outcome)
    }

    /// Failed checks with their messages.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.checks.iter().filter_map(|c| match &c.outcome {
            CheckOutcome::Failed(msg) => Some((c.name, msg.as_str())),
            _ => None,
        })
    }

    /// Total wall time.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.checks.iter().map(|c| c.duration).sum()
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        print!("{self}");
    }

    fn count(&self, pred: impl Fn(&CheckOutcome) -> bool) -> usize {
        self.checks.iter().filter(|c| pred(&c.outcome)).count()
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            match &check.outcome {
                CheckOutcome::Passed => writeln!(f, "  ok      {} ({:?})", check.name, check.duration)?,
                CheckOutcome::Skipped(why) => writeln!(f, "  skipped {} ({why})", check.name)?,
                CheckOutcome::Failed(msg) => writeln!(f, "  FAILED  {}: {msg}", check.name)?,
            }
        }
        writeln!(
            f,
            "Passed: {}, Skipped: {}, Failed: {}, Duration: {:?}",
            self.passed(),
            self.skipped(),
            self.failed(),
            self.duration()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_lookup() {
        let mut report = ConformanceReport::new();
        report.record("a", CheckOutcome::Passed, Duration::from_millis(2));
        report.record("b", CheckOutcome::Skipped("no seeking"), Duration::ZERO);
        report.record("c", CheckOutcome::Failed("boom".into()), Duration::from_millis(1));

        assert_eq!(report.passed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_conformant());
        assert_eq!(report.outcome("a"), Some(&CheckOutcome::Passed));
        assert_eq!(report.failures().collect::<Vec<_>>(), vec![("c", "boom")]);
        assert_eq!(report.duration(), Duration::from_millis(3));
    }

    #[test]
    fn display_lists_failures() {
        let mut report = ConformanceReport::new();
        report.record("round_trip", CheckOutcome::Failed("mismatch".into()), Duration::ZERO);
        let text = report.to_string();
        assert!(text.contains("FAILED  round_trip: mismatch"));
        assert!(text.contains("Failed: 1"));
    }

    #[test]
    fn empty_report_is_conformant() {
        assert!(ConformanceReport::new().is_conformant());
    }
}
