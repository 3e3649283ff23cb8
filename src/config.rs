//! Engine configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Default tolerance in currency units
pub const DEFAULT_TOLERANCE: i64 = 5;

/// Candidates considered by the general subset search. 2^28 subsets is the
/// practical ceiling for interactive use; anything past the cap is excluded.
pub const MAX_SUBSET_CANDIDATES: usize = 28;

/// Hard upper bound on any configured candidate cap
pub const CANDIDATE_CEILING: usize = 32;

/// Ranked alternatives kept when nothing matches
pub const MAX_ALTERNATIVES: usize = 5;

/// Weight given to rules synthesized from confirmed matches
pub const GENERATED_RULE_WEIGHT: u32 = 10;

/// Priority given to rules synthesized from confirmed matches
pub const GENERATED_RULE_PRIORITY: i32 = 1;

/// Tunables for a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Maximum absolute deviation for a subset to count as an exact match
    pub tolerance: BigDecimal,
    /// Candidates fed to the general subset search, clamped to [`CANDIDATE_CEILING`]
    pub max_candidates: usize,
    /// Alternatives reported for an unmatched code
    pub max_alternatives: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tolerance: BigDecimal::from(DEFAULT_TOLERANCE),
            max_candidates: MAX_SUBSET_CANDIDATES,
            max_alternatives: MAX_ALTERNATIVES,
        }
    }
}

impl ReconcileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: BigDecimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn with_max_alternatives(mut self, max_alternatives: usize) -> Self {
        self.max_alternatives = max_alternatives;
        self
    }

    /// Candidate cap actually used by the search
    pub fn effective_max_candidates(&self) -> usize {
        if self.max_candidates > CANDIDATE_CEILING {
            tracing::warn!(
                requested = self.max_candidates,
                ceiling = CANDIDATE_CEILING,
                "candidate cap clamped"
            );
            CANDIDATE_CEILING
        } else {
            self.max_candidates
        }
    }

    /// Tolerance as a non-negative value
    pub fn effective_tolerance(&self) -> BigDecimal {
        self.tolerance.abs()
    }
}
