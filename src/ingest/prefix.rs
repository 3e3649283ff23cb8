//! Account-prefix bucketing for payroll ledgers

use serde::{Deserialize, Serialize};

use crate::types::LedgerEntry;

/// Leading-digit account ranges for each bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPrefixes {
    /// Payroll expense accounts (class 5 in the Norwegian standard chart)
    pub expense: Vec<String>,
    /// Withholding, employer-tax and holiday-pay accrual accounts
    pub accrual: Vec<String>,
}

impl Default for AccountPrefixes {
    fn default() -> Self {
        Self {
            expense: vec!["5".to_string()],
            accrual: vec!["26".to_string(), "27".to_string(), "29".to_string()],
        }
    }
}

/// Disjoint partition of ledger entries by account prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountBuckets<'a> {
    pub expense: Vec<&'a LedgerEntry>,
    pub accrual: Vec<&'a LedgerEntry>,
}

/// Split entries into expense and accrual buckets using the default prefixes
pub fn classify_by_account_prefix(entries: &[LedgerEntry]) -> AccountBuckets<'_> {
    classify_by_prefixes(entries, &AccountPrefixes::default())
}

/// Split entries into expense and accrual buckets.
///
/// Matching is an exact prefix test on the trimmed account. The expense bucket
/// is checked first so an entry never lands in both; entries matching neither
/// are left out.
pub fn classify_by_prefixes<'a>(
    entries: &'a [LedgerEntry],
    prefixes: &AccountPrefixes,
) -> AccountBuckets<'a> {
    let mut buckets = AccountBuckets::default();

    for entry in entries {
        let account = entry.account.trim();
        if has_prefix(account, &prefixes.expense) {
            buckets.expense.push(entry);
        } else if has_prefix(account, &prefixes.accrual) {
            buckets.accrual.push(entry);
        }
    }

    buckets
}

fn has_prefix(account: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .any(|p| !p.is_empty() && account.starts_with(p.as_str()))
}
