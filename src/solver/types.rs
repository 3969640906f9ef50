//! Configuration and statistics for solving sessions.

use std::fmt;
use std::str::FromStr;

/// Scheduling strategy for the deferred phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TacticKind {
    /// One pass in assertion order.
    Simple,
    /// Two passes in assertion order. Conditionals are rejected.
    SimpleTwoPass,
    /// Unconditional constraints first, then conditionals and implications
    /// once their condition variables have been narrowed.
    #[default]
    WithReorder,
}

impl TacticKind {
    pub const ALL: [TacticKind; 3] = [
        TacticKind::Simple,
        TacticKind::SimpleTwoPass,
        TacticKind::WithReorder,
    ];
}

impl fmt::Display for TacticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TacticKind::Simple => "simple",
            TacticKind::SimpleTwoPass => "two-pass",
            TacticKind::WithReorder => "reorder",
        };
        f.write_str(name)
    }
}

impl FromStr for TacticKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(TacticKind::Simple),
            "two-pass" | "twopass" | "simple-two-pass" => Ok(TacticKind::SimpleTwoPass),
            "reorder" | "with-reorder" => Ok(TacticKind::WithReorder),
            other => Err(format!(
                "unknown tactic '{}' (expected simple, two-pass or reorder)",
                other
            )),
        }
    }
}

/// Session options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverOptions {
    pub tactic: TacticKind,
    /// Report phase summaries at `info` instead of `debug`.
    pub debug: bool,
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tactic(mut self, tactic: TacticKind) -> Self {
        self.tactic = tactic;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Counters accumulated over the lifetime of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Number of `check` calls that actually ran evaluation
    pub checks: usize,
    pub eager_evaluated: usize,
    pub deferred_evaluated: usize,
    /// Times a not-yet-ready constraint was pushed to the back of the queue
    pub reorder_skips: usize,
    /// Constraints evaluated by the no-progress fallback
    pub forced: usize,
    pub alias_merges: usize,
}

impl fmt::Display for SolverStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checks: {}, eager: {}, deferred: {}, reorder skips: {}, forced: {}, merges: {}",
            self.checks,
            self.eager_evaluated,
            self.deferred_evaluated,
            self.reorder_skips,
            self.forced,
            self.alias_merges
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tactic_names_round_trip() {
        for kind in TacticKind::ALL {
            assert_eq!(kind.to_string().parse::<TacticKind>().unwrap(), kind);
        }
        assert_eq!("With-Reorder".parse::<TacticKind>().unwrap(), TacticKind::WithReorder);
        assert!("greedy".parse::<TacticKind>().is_err());
    }

    #[test]
    fn test_default_options() {
        let opts = SolverOptions::default();
        assert_eq!(opts.tactic, TacticKind::WithReorder);
        assert!(!opts.debug);
        let opts = SolverOptions::new().with_tactic(TacticKind::Simple).with_debug(true);
        assert_eq!(opts.tactic, TacticKind::Simple);
        assert!(opts.debug);
    }
}
