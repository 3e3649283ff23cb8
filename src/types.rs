//! Core types and data structures for ledger reconciliation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One bookkeeping line read from a general ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Chart-of-accounts identifier (e.g. "5000")
    pub account: String,
    /// Free-text line description
    pub description: String,
    /// Signed amount in currency units
    pub amount: BigDecimal,
    /// Posting date, when the source carried one
    pub date: Option<NaiveDate>,
}

impl LedgerEntry {
    /// Create a new ledger entry without a date
    pub fn new(account: String, description: String, amount: BigDecimal) -> Self {
        Self {
            account,
            description,
            amount,
            date: None,
        }
    }

    /// Attach a posting date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// How a future rule-application step should treat a rule's matches.
///
/// Matching itself never branches on the strategy; rule synthesis only ever
/// emits [`RuleStrategy::Exclusive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStrategy {
    /// Sole classifier for its account/code pair
    Exclusive,
    /// Amount shared across several codes (declared, not resolved numerically)
    Split,
    /// General scored classifier
    #[default]
    Score,
}

impl fmt::Display for RuleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStrategy::Exclusive => write!(f, "exclusive"),
            RuleStrategy::Split => write!(f, "split"),
            RuleStrategy::Score => write!(f, "score"),
        }
    }
}

/// Declarative classifier linking ledger entries to a target code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Account pattern, matched by equality or substring containment. Empty means none.
    #[serde(default)]
    pub account: String,
    /// Target code this rule classifies into
    pub code: String,
    #[serde(default)]
    pub strategy: RuleStrategy,
    /// Tie-break weight, at least 1
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Case-insensitive substrings checked against account and description
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Case-insensitive pattern checked against account and description
    #[serde(default)]
    pub regex: Option<String>,
    /// Reserved for downstream ordering
    #[serde(default)]
    pub priority: i32,
    /// Reserved for seasonal disambiguation (1-12)
    #[serde(default)]
    pub month_hints: Vec<u32>,
}

fn default_weight() -> u32 {
    1
}

impl MappingRule {
    /// Create a weight-1 `score` rule selecting by account pattern
    pub fn new(code: String, account: String) -> Self {
        Self {
            account,
            code,
            strategy: RuleStrategy::Score,
            weight: default_weight(),
            keywords: Vec::new(),
            regex: None,
            priority: 0,
            month_hints: Vec::new(),
        }
    }

    /// Create a rule with no account pattern, selecting by keywords only
    pub fn keyword(code: String, keywords: Vec<String>) -> Self {
        Self {
            keywords,
            ..Self::new(code, String::new())
        }
    }

    pub fn with_strategy(mut self, strategy: RuleStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_keyword(mut self, keyword: String) -> Self {
        self.keywords.push(keyword);
        self
    }

    pub fn with_regex(mut self, regex: String) -> Self {
        self.regex = Some(regex);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_month_hints(mut self, month_hints: Vec<u32>) -> Self {
        self.month_hints = month_hints;
        self
    }

    /// Whether the rule carries any selector at all
    pub fn has_selector(&self) -> bool {
        !self.account.trim().is_empty()
            || self.keywords.iter().any(|k| !k.trim().is_empty())
            || self.regex.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// A ranked near-miss subset offered when no exact match exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub entries: Vec<LedgerEntry>,
    /// Achieved sum of the subset
    pub sum: BigDecimal,
    /// Absolute difference from the target amount
    pub difference: BigDecimal,
    /// Sum of entry weights
    pub total_weight: u64,
}

/// Resolution of a single target code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactMatchResult {
    pub target_amount: BigDecimal,
    /// Chosen entries, or `None` when nothing falls within tolerance.
    /// Empty only when the target is exactly zero.
    pub exact: Option<Vec<LedgerEntry>>,
    /// Closest subsets ranked by difference; only populated when `exact` is `None`
    pub alternatives: Vec<Alternative>,
}

impl ExactMatchResult {
    pub fn matched(target_amount: BigDecimal, entries: Vec<LedgerEntry>) -> Self {
        Self {
            target_amount,
            exact: Some(entries),
            alternatives: Vec::new(),
        }
    }

    pub fn unmatched(target_amount: BigDecimal, alternatives: Vec<Alternative>) -> Self {
        Self {
            target_amount,
            exact: None,
            alternatives,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.exact.is_some()
    }

    /// Sum of the exact match, if any
    pub fn matched_sum(&self) -> Option<BigDecimal> {
        self.exact
            .as_ref()
            .map(|entries| entries.iter().map(|e| &e.amount).sum())
    }

    /// Absolute difference between the exact match and the target, if any
    pub fn difference(&self) -> Option<BigDecimal> {
        self.matched_sum()
            .map(|sum| (sum - &self.target_amount).abs())
    }
}

/// Raw spreadsheet-like cell as handed over by a tabular reader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Decimal(BigDecimal),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    /// Textual view of the cell; integral numbers render without a fraction
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Decimal(d) => d.normalized().to_string(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<BigDecimal> for CellValue {
    fn from(value: BigDecimal) -> Self {
        CellValue::Decimal(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// Ledger column the normalizer must locate in the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnField {
    Account,
    Description,
    Amount,
    Date,
}

impl fmt::Display for ColumnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnField::Account => write!(f, "account"),
            ColumnField::Description => write!(f, "description"),
            ColumnField::Amount => write!(f, "amount"),
            ColumnField::Date => write!(f, "date"),
        }
    }
}

/// Errors raised while turning a grid into ledger entries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    #[error("Missing {field} column (looked for headers containing {hints:?})")]
    MissingColumn {
        field: ColumnField,
        hints: Vec<String>,
    },
    #[error("Header row {row} is out of range: grid has {rows} rows")]
    HeaderRowOutOfRange { row: usize, rows: usize },
    #[error("Grid is empty")]
    EmptyGrid,
}

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;

/// Non-fatal diagnostics raised while compiling a rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RuleWarning {
    #[error("Rule for code '{code}' skipped: invalid regex '{pattern}': {message}")]
    InvalidRegex {
        code: String,
        pattern: String,
        message: String,
    },
}

/// Errors raised when checking the shape of a mapping rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Rule for code '{code}' has no account, keyword or regex selector")]
    NoSelector { code: String },
    #[error("Invalid regex '{pattern}' in rule for code '{code}': {message}")]
    InvalidRegex {
        code: String,
        pattern: String,
        message: String,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for rule validation
pub type RuleResult<T> = Result<T, RuleError>;
