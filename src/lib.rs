//! # Payroll Recon Core
//!
//! Reconciles free-form general-ledger entries against externally reported
//! totals (such as the payroll components of a statutory report) and decides,
//! per target code, exactly which ledger lines make up each total.
//!
//! ## Features
//!
//! - **Ingestion**: Locale-tolerant amount parsing and fuzzy header detection for tabular ledgers
//! - **Candidate selection**: Account, keyword and regex mapping rules per target code
//! - **Exact matching**: Single, pair and exhaustive subset search within a tolerance
//! - **Deterministic tie-breaks**: Fewest lines, then highest rule weight, then smallest difference
//! - **Rule learning**: Exclusive rules synthesized from confirmed matches
//! - **Rule validation**: Pluggable shape checks for rules a caller loads or persists
//!
//! ## Quick Start
//!
//! ```rust
//! use payroll_recon_core::{reconcile, LedgerEntry, MappingRule, Targets};
//! use bigdecimal::BigDecimal;
//!
//! let entries = vec![LedgerEntry::new(
//!     "5000".to_string(),
//!     "Fastlønn januar".to_string(),
//!     BigDecimal::from(600000),
//! )];
//! let rules = vec![MappingRule::new("fastlon".to_string(), "5000".to_string())];
//! let mut targets = Targets::new();
//! targets.insert("fastlon".to_string(), BigDecimal::from(600000));
//!
//! let report = reconcile(&entries, &targets, &rules);
//! assert!(report.matches["fastlon"].is_matched());
//! ```

pub mod config;
pub mod ingest;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ingest::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
