//! Subset search for a single target amount

use bigdecimal::{BigDecimal, Zero};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::config::ReconcileConfig;
use crate::types::*;

/// Decimal places kept when amounts are scaled to integers for the search
const MAX_SEARCH_SCALE: i64 = 12;

/// A candidate entry with the weight it carries for the code being resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEntry<'e> {
    pub entry: &'e LedgerEntry,
    pub weight: u32,
}

impl<'e> WeightedEntry<'e> {
    pub fn new(entry: &'e LedgerEntry, weight: u32) -> Self {
        Self { entry, weight }
    }
}

/// Amounts shifted to a common scale so subset sums are exact integer math
struct ScaledSearch<'c, 'e> {
    candidates: Vec<(&'c WeightedEntry<'e>, i128)>,
    target: i128,
    tolerance: i128,
}

impl<'c, 'e> ScaledSearch<'c, 'e> {
    fn new(
        candidates: &'c [WeightedEntry<'e>],
        target: &BigDecimal,
        tolerance: &BigDecimal,
    ) -> Option<Self> {
        let scale = candidates
            .iter()
            .map(|c| scale_of(&c.entry.amount))
            .chain([scale_of(target), scale_of(tolerance)])
            .max()
            .unwrap_or(0)
            .clamp(0, MAX_SEARCH_SCALE);

        let scaled = candidates
            .iter()
            .filter_map(|c| match to_scaled_exact(&c.entry.amount, scale) {
                Ok(units) => Some((c, units)),
                Err(reason) => {
                    tracing::warn!(
                        account = %c.entry.account,
                        amount = %c.entry.amount,
                        reason,
                        "candidate ignored"
                    );
                    None
                }
            })
            .collect();

        Some(Self {
            candidates: scaled,
            target: to_scaled_exact(target, scale).ok()?,
            // truncating only ever narrows the tolerance
            tolerance: to_scaled(tolerance, scale)?,
        })
    }

    fn diff(&self, sum: i128) -> i128 {
        (sum - self.target).abs()
    }

    fn qualifies(&self, sum: i128) -> bool {
        self.diff(sum) <= self.tolerance
    }

    /// Best single entry within tolerance: highest weight, then smallest
    /// difference, then ledger order.
    fn best_single(&self) -> Option<Vec<usize>> {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, (_, amount))| self.qualifies(*amount))
            .min_by_key(|(i, (c, amount))| (Reverse(c.weight), self.diff(*amount), *i))
            .map(|(i, _)| vec![i])
    }

    /// Best unordered pair within tolerance, ranked like singles
    fn best_pair(&self) -> Option<Vec<usize>> {
        let mut best: Option<((Reverse<u64>, i128, usize, usize), Vec<usize>)> = None;

        for (i, (a, amount_a)) in self.candidates.iter().enumerate() {
            for (j, (b, amount_b)) in self.candidates.iter().enumerate().skip(i + 1) {
                let sum = amount_a + amount_b;
                if !self.qualifies(sum) {
                    continue;
                }
                let key = (
                    Reverse(u64::from(a.weight) + u64::from(b.weight)),
                    self.diff(sum),
                    i,
                    j,
                );
                if best.as_ref().map_or(true, |(k, _)| key < *k) {
                    best = Some((key, vec![i, j]));
                }
            }
        }

        best.map(|(_, picked)| picked)
    }

    /// Enumerate every non-empty subset of the first `cap` candidates.
    ///
    /// Subsets are walked in Gray-code order so each step adds or removes a
    /// single entry. Among qualifying subsets the winner has the fewest
    /// entries, then the highest total weight, then the smallest difference,
    /// then the smallest bitmask. When nothing qualifies, the closest
    /// `max_alternatives` subsets are returned instead.
    fn exhaustive(&self, cap: usize, max_alternatives: usize) -> SubsetOutcome {
        let k = self.candidates.len().min(cap);
        if k == 0 {
            return SubsetOutcome::NoMatch(Vec::new());
        }

        let amounts: Vec<i128> = self.candidates[..k].iter().map(|(_, a)| *a).collect();
        let weights: Vec<u64> = self.candidates[..k]
            .iter()
            .map(|(c, _)| u64::from(c.weight))
            .collect();

        let mut best: Option<(u32, Reverse<u64>, i128, u64)> = None;
        let mut closest: BinaryHeap<(i128, u32, u64)> = BinaryHeap::new();

        let mut mask: u64 = 0;
        let mut sum: i128 = 0;
        let mut weight: u64 = 0;
        let mut count: u32 = 0;

        for step in 1u64..(1u64 << k) {
            let bit = step.trailing_zeros() as usize;
            let flag = 1u64 << bit;
            mask ^= flag;
            if mask & flag != 0 {
                sum += amounts[bit];
                weight += weights[bit];
                count += 1;
            } else {
                sum -= amounts[bit];
                weight -= weights[bit];
                count -= 1;
            }

            let diff = self.diff(sum);
            if diff <= self.tolerance {
                let key = (count, Reverse(weight), diff, mask);
                if best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
            } else if best.is_none() && max_alternatives > 0 {
                let key = (diff, count, mask);
                if closest.len() < max_alternatives {
                    closest.push(key);
                } else if closest.peek().is_some_and(|worst| key < *worst) {
                    closest.pop();
                    closest.push(key);
                }
            }
        }

        match best {
            Some((_, _, _, mask)) => SubsetOutcome::Exact(mask_indices(mask, k)),
            None => SubsetOutcome::NoMatch(
                closest
                    .into_sorted_vec()
                    .into_iter()
                    .map(|(_, _, mask)| mask_indices(mask, k))
                    .collect(),
            ),
        }
    }

    fn entries(&self, indices: &[usize]) -> Vec<LedgerEntry> {
        indices
            .iter()
            .map(|&i| self.candidates[i].0.entry.clone())
            .collect()
    }

    fn alternative(&self, indices: &[usize], target: &BigDecimal) -> Alternative {
        let entries = self.entries(indices);
        let sum: BigDecimal = entries.iter().map(|e| &e.amount).sum();
        let difference = (&sum - target).abs();
        let total_weight = indices
            .iter()
            .map(|&i| u64::from(self.candidates[i].0.weight))
            .sum();

        Alternative {
            entries,
            sum,
            difference,
            total_weight,
        }
    }
}

enum SubsetOutcome {
    Exact(Vec<usize>),
    NoMatch(Vec<Vec<usize>>),
}

fn mask_indices(mask: u64, k: usize) -> Vec<usize> {
    (0..k).filter(|i| mask & (1u64 << i) != 0).collect()
}

fn scale_of(amount: &BigDecimal) -> i64 {
    amount.as_bigint_and_exponent().1
}

fn to_scaled(amount: &BigDecimal, scale: i64) -> Option<i128> {
    let (digits, _) = amount.with_scale(scale).as_bigint_and_exponent();
    i128::try_from(digits).ok()
}

/// Scale without losing digits; amounts finer than the search scale are refused
fn to_scaled_exact(amount: &BigDecimal, scale: i64) -> Result<i128, &'static str> {
    if &amount.with_scale(scale) != amount {
        return Err("more decimal places than the search supports");
    }
    to_scaled(amount, scale).ok_or("amount out of search range")
}

/// Find the subset of `candidates` that best reconciles to `target`.
///
/// A zero target resolves to an empty match. Otherwise single entries are
/// tried first, then pairs, then an exhaustive search over the first
/// `config.max_candidates` candidates.
pub fn find_match(
    candidates: &[WeightedEntry<'_>],
    target: &BigDecimal,
    config: &ReconcileConfig,
) -> ExactMatchResult {
    if target.is_zero() {
        return ExactMatchResult::matched(target.clone(), Vec::new());
    }

    let tolerance = config.effective_tolerance();
    let Some(search) = ScaledSearch::new(candidates, target, &tolerance) else {
        tracing::warn!(target_amount = %target, "target out of search range");
        return ExactMatchResult::unmatched(target.clone(), Vec::new());
    };

    if let Some(picked) = search.best_single().or_else(|| search.best_pair()) {
        return ExactMatchResult::matched(target.clone(), search.entries(&picked));
    }

    let cap = config.effective_max_candidates();
    if search.candidates.len() > cap {
        tracing::debug!(
            candidates = search.candidates.len(),
            cap,
            "candidates beyond cap excluded from subset search"
        );
    }

    match search.exhaustive(cap, config.max_alternatives) {
        SubsetOutcome::Exact(picked) => {
            ExactMatchResult::matched(target.clone(), search.entries(&picked))
        }
        SubsetOutcome::NoMatch(closest) => ExactMatchResult::unmatched(
            target.clone(),
            closest
                .iter()
                .map(|picked| search.alternative(picked, target))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn entries(amounts: &[&str]) -> Vec<LedgerEntry> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                LedgerEntry::new(format!("50{:02}", i), format!("line {}", i), dec(a))
            })
            .collect()
    }

    fn weighted(entries: &[LedgerEntry]) -> Vec<WeightedEntry<'_>> {
        entries.iter().map(|e| WeightedEntry::new(e, 1)).collect()
    }

    fn amounts(result: &ExactMatchResult) -> Vec<BigDecimal> {
        result
            .exact
            .as_ref()
            .unwrap()
            .iter()
            .map(|e| e.amount.clone())
            .collect()
    }

    #[test]
    fn test_zero_target_is_empty_match() {
        let ledger = entries(&["100", "-100"]);
        let result = find_match(&weighted(&ledger), &BigDecimal::zero(), &ReconcileConfig::default());
        assert_eq!(result.exact, Some(Vec::new()));
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_single_within_tolerance() {
        let config = ReconcileConfig::default();
        let target = BigDecimal::from(50000);

        for amount in ["49998", "50003", "49995", "50005"] {
            let ledger = entries(&[amount]);
            let result = find_match(&weighted(&ledger), &target, &config);
            assert_eq!(amounts(&result), vec![dec(amount)], "amount {}", amount);
        }

        let ledger = entries(&["50010"]);
        let result = find_match(&weighted(&ledger), &target, &config);
        assert!(result.exact.is_none());
    }

    #[test]
    fn test_single_prefers_weight_then_difference() {
        let ledger = entries(&["1002", "1000", "1000"]);
        let mut candidates = weighted(&ledger);
        candidates[2].weight = 4;

        let result = find_match(&candidates, &BigDecimal::from(1000), &ReconcileConfig::default());
        assert_eq!(result.exact.as_ref().unwrap()[0].account, "5002");

        let candidates = weighted(&ledger);
        let result = find_match(&candidates, &BigDecimal::from(1000), &ReconcileConfig::default());
        assert_eq!(result.exact.as_ref().unwrap()[0].account, "5001");
    }

    #[test]
    fn test_pair_match() {
        let ledger = entries(&["300", "60000", "1200", "40000"]);
        let result = find_match(&weighted(&ledger), &BigDecimal::from(100000), &ReconcileConfig::default());
        assert_eq!(amounts(&result), vec![dec("60000"), dec("40000")]);
    }

    #[test]
    fn test_exhaustive_prefers_fewest_entries() {
        // 100 = 50 + 30 + 20 = 50 + 30 + 11 + 9; no single or pair reaches it
        let ledger = entries(&["50", "30", "20", "11", "9", "1"]);
        let config = ReconcileConfig::new().with_tolerance(BigDecimal::zero());
        let result = find_match(&weighted(&ledger), &BigDecimal::from(100), &config);
        assert_eq!(amounts(&result), vec![dec("50"), dec("30"), dec("20")]);
    }

    #[test]
    fn test_exhaustive_weight_breaks_size_ties() {
        let ledger = entries(&["50", "30", "20", "40", "35", "25"]);
        let mut candidates = weighted(&ledger);
        candidates[3].weight = 5;
        let config = ReconcileConfig::new().with_tolerance(BigDecimal::zero());

        let result = find_match(&candidates, &BigDecimal::from(100), &config);
        assert_eq!(amounts(&result), vec![dec("40"), dec("35"), dec("25")]);
    }

    #[test]
    fn test_no_match_returns_sorted_alternatives() {
        let ledger = entries(&["10", "20", "40"]);
        let result = find_match(&weighted(&ledger), &BigDecimal::from(100), &ReconcileConfig::default());

        assert!(result.exact.is_none());
        assert_eq!(result.alternatives.len(), 5);

        let diffs: Vec<BigDecimal> = result.alternatives.iter().map(|a| a.difference.clone()).collect();
        assert_eq!(diffs, vec![dec("30"), dec("40"), dec("50"), dec("60"), dec("70")]);

        let best = &result.alternatives[0];
        assert_eq!(best.sum, dec("70"));
        assert_eq!(best.entries.len(), 3);
        assert_eq!(best.total_weight, 3);
        for alt in &result.alternatives {
            let sum: BigDecimal = alt.entries.iter().map(|e| &e.amount).sum();
            assert_eq!(sum, alt.sum);
            assert_eq!((&sum - BigDecimal::from(100)).abs(), alt.difference);
        }
    }

    #[test]
    fn test_no_candidates() {
        let result = find_match(&[], &BigDecimal::from(100), &ReconcileConfig::default());
        assert!(result.exact.is_none());
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_candidates_beyond_cap_are_excluded() {
        let ledger = entries(&["1", "2", "4", "100", "200"]);
        let config = ReconcileConfig::new()
            .with_tolerance(BigDecimal::zero())
            .with_max_candidates(3);

        // 1 + 2 + 4 is inside the cap
        let result = find_match(&weighted(&ledger), &BigDecimal::from(7), &config);
        assert_eq!(amounts(&result), vec![dec("1"), dec("2"), dec("4")]);

        // 100 + 200 + 1 needs a candidate past the cap
        let result = find_match(&weighted(&ledger), &BigDecimal::from(301), &config);
        assert!(result.exact.is_none());
    }

    #[test]
    fn test_decimal_amounts_are_exact() {
        let ledger = entries(&["0.10", "0.20", "0.05"]);
        let config = ReconcileConfig::new().with_tolerance(BigDecimal::zero());
        let result = find_match(&weighted(&ledger), &dec("0.35"), &config);
        assert_eq!(amounts(&result), vec![dec("0.10"), dec("0.20"), dec("0.05")]);
    }

    #[test]
    fn test_negative_amounts() {
        let ledger = entries(&["1500", "-250", "-250", "900"]);
        let config = ReconcileConfig::new().with_tolerance(BigDecimal::zero());
        let result = find_match(&weighted(&ledger), &BigDecimal::from(1000), &config);
        assert_eq!(amounts(&result), vec![dec("1500"), dec("-250"), dec("-250")]);
    }

    #[test]
    fn test_amounts_finer_than_search_scale_are_ignored() {
        // truncating to 12 places would make this line hit the target exactly
        let ledger = entries(&["1000.00000000000001", "999"]);
        let config = ReconcileConfig::new().with_tolerance(BigDecimal::zero());
        let result = find_match(&weighted(&ledger), &BigDecimal::from(1000), &config);

        assert!(result.exact.is_none());
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].sum, dec("999"));
    }

    #[test]
    fn test_trailing_zeros_beyond_search_scale_are_exact() {
        let ledger = entries(&["1000.00000000000000"]);
        let config = ReconcileConfig::new().with_tolerance(BigDecimal::zero());
        let result = find_match(&weighted(&ledger), &BigDecimal::from(1000), &config);
        assert_eq!(amounts(&result), vec![dec("1000")]);
    }
}
