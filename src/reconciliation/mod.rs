//! Reconciliation module matching ledger entries to reported target totals
//!
//! Candidates are selected per code by mapping rules, weighted by account
//! containment, and resolved by an exact subset search. Confirmed matches can
//! be turned back into exclusive rules for the next run.

pub mod engine;
pub mod rules;
pub mod search;
pub mod synthesis;

pub use engine::*;
pub use rules::{candidates_for_code, CompiledRule, RuleSet};
pub use search::{find_match, WeightedEntry};
pub use synthesis::generate_exclusive_rules;
