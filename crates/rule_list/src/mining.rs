//! Candidate rule mining.
//!
//! Rows are split by class label and every partition is mined for frequent
//! itemsets of `feature=category` items. The union of all partitions, in a
//! canonical order, becomes the candidate pool handed to the trainer.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::debug;

use crate::dataframe::CategoricalMatrix;
use crate::error::{Result, RuleListError};
use crate::pool::CandidatePool;
use crate::rules::Clause;

/// Frequent itemset mining backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FimMethod {
    #[default]
    Eclat,
    Apriori,
}

impl FimMethod {
    /// Resolve a backend by name. Unknown names fall back to Eclat.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "eclat" => FimMethod::Eclat,
            "apriori" => FimMethod::Apriori,
            other => {
                debug!(method = other, "unknown mining method, using eclat");
                FimMethod::Eclat
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FimMethod::Eclat => "eclat",
            FimMethod::Apriori => "apriori",
        }
    }

    pub fn miner(&self) -> &'static dyn ItemsetMiner {
        match self {
            FimMethod::Eclat => &Eclat,
            FimMethod::Apriori => &Apriori,
        }
    }
}

/// A frequent itemset miner over string-item transactions.
///
/// `support_pct` is a percentage of the transactions; `min_len..=max_len`
/// bounds the itemset size. Items inside each returned itemset are sorted.
pub trait ItemsetMiner: Send + Sync {
    fn mine(
        &self,
        transactions: &[Vec<String>],
        support_pct: u32,
        min_len: usize,
        max_len: usize,
    ) -> Vec<Vec<String>>;
}

/// Minimum number of transactions an itemset must appear in.
pub fn min_support_count(support_pct: u32, n_transactions: usize) -> usize {
    let count = (support_pct as f64 * n_transactions as f64 / 100.0).ceil() as usize;
    count.max(1)
}

/// Items of a transaction set with their sorted transaction-id lists.
struct ItemIndex {
    items: Vec<String>,
    tids: Vec<Vec<u32>>,
}

impl ItemIndex {
    fn build(transactions: &[Vec<String>]) -> Self {
        let mut by_item: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for (tid, transaction) in transactions.iter().enumerate() {
            for item in transaction {
                let tids = by_item.entry(item.as_str()).or_default();
                // duplicate items within one transaction count once
                if tids.last() != Some(&(tid as u32)) {
                    tids.push(tid as u32);
                }
            }
        }
        let (items, tids) = by_item
            .into_iter()
            .map(|(item, tids)| (item.to_string(), tids))
            .unzip();
        ItemIndex { items, tids }
    }

    fn frequent_singletons(&self, min_count: usize) -> Vec<(usize, Vec<u32>)> {
        self.tids
            .iter()
            .enumerate()
            .filter(|(_, tids)| tids.len() >= min_count)
            .map(|(id, tids)| (id, tids.clone()))
            .collect()
    }

    fn names(&self, itemset: &[usize]) -> Vec<String> {
        itemset.iter().map(|&id| self.items[id].clone()).collect()
    }
}

fn intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Depth-first mining over vertical tid-lists.
#[derive(Clone, Copy, Debug, Default)]
pub struct Eclat;

impl Eclat {
    fn extend(
        prefix: &mut Vec<usize>,
        candidates: &[(usize, Vec<u32>)],
        min_count: usize,
        min_len: usize,
        max_len: usize,
        out: &mut Vec<Vec<usize>>,
    ) {
        for (i, (item, tids)) in candidates.iter().enumerate() {
            prefix.push(*item);
            if prefix.len() >= min_len {
                out.push(prefix.clone());
            }
            if prefix.len() < max_len {
                let extensions: Vec<(usize, Vec<u32>)> = candidates[i + 1..]
                    .iter()
                    .filter_map(|(other, other_tids)| {
                        let shared = intersect(tids, other_tids);
                        (shared.len() >= min_count).then_some((*other, shared))
                    })
                    .collect();
                if !extensions.is_empty() {
                    Self::extend(prefix, &extensions, min_count, min_len, max_len, out);
                }
            }
            prefix.pop();
        }
    }
}

impl ItemsetMiner for Eclat {
    fn mine(
        &self,
        transactions: &[Vec<String>],
        support_pct: u32,
        min_len: usize,
        max_len: usize,
    ) -> Vec<Vec<String>> {
        if transactions.is_empty() || max_len == 0 || min_len > max_len {
            return Vec::new();
        }
        let index = ItemIndex::build(transactions);
        let min_count = min_support_count(support_pct, transactions.len());
        let singletons = index.frequent_singletons(min_count);

        let mut found = Vec::new();
        Self::extend(
            &mut Vec::with_capacity(max_len),
            &singletons,
            min_count,
            min_len,
            max_len,
            &mut found,
        );
        found.iter().map(|itemset| index.names(itemset)).collect()
    }
}

/// Level-wise mining: frequent k-itemsets are joined into (k+1)-candidates,
/// pruned by the downward-closure property, then counted.
#[derive(Clone, Copy, Debug, Default)]
pub struct Apriori;

impl ItemsetMiner for Apriori {
    fn mine(
        &self,
        transactions: &[Vec<String>],
        support_pct: u32,
        min_len: usize,
        max_len: usize,
    ) -> Vec<Vec<String>> {
        if transactions.is_empty() || max_len == 0 || min_len > max_len {
            return Vec::new();
        }
        let index = ItemIndex::build(transactions);
        let min_count = min_support_count(support_pct, transactions.len());

        let mut level: BTreeMap<Vec<usize>, Vec<u32>> = index
            .frequent_singletons(min_count)
            .into_iter()
            .map(|(id, tids)| (vec![id], tids))
            .collect();
        let mut found = Vec::new();
        let mut size = 1;

        while !level.is_empty() {
            if size >= min_len {
                found.extend(level.keys().cloned());
            }
            if size == max_len {
                break;
            }
            let keys: Vec<&Vec<usize>> = level.keys().collect();
            let mut next = BTreeMap::new();
            for (a_pos, a) in keys.iter().enumerate() {
                for b in keys[a_pos + 1..].iter() {
                    // keys are sorted, so joinable partners are contiguous
                    if a[..size - 1] != b[..size - 1] {
                        break;
                    }
                    let mut candidate = (*a).clone();
                    candidate.push(b[size - 1]);
                    let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                        let subset: Vec<usize> = candidate
                            .iter()
                            .enumerate()
                            .filter(|(pos, _)| *pos != skip)
                            .map(|(_, id)| *id)
                            .collect();
                        level.contains_key(&subset)
                    });
                    if !all_subsets_frequent {
                        continue;
                    }
                    let tids = intersect(&level[*a], &level[*b]);
                    if tids.len() >= min_count {
                        next.insert(candidate, tids);
                    }
                }
            }
            level = next;
            size += 1;
        }
        found.iter().map(|itemset| index.names(itemset)).collect()
    }
}

/// Parameters of candidate mining.
#[derive(Clone, Debug, PartialEq)]
pub struct MiningParams {
    /// Minimum support as a fraction in (0, 1].
    pub min_support: f64,
    pub min_len: usize,
    pub max_len: usize,
    pub method: FimMethod,
}

impl MiningParams {
    /// Support threshold in whole percent, truncated.
    pub fn support_pct(&self) -> u32 {
        (self.min_support * 100.0).floor().max(0.0) as u32
    }
}

/// One transaction per selected row: the row's `feature=category` items.
pub fn categorical_to_transactions(x: &CategoricalMatrix, rows: &[usize]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|&i| {
            x.row(i)
                .iter()
                .enumerate()
                .map(|(feature_idx, &category)| Clause::new(feature_idx, category).item())
                .collect()
        })
        .collect()
}

/// Convert a mined itemset back into clauses, sorted by `(feature, category)`.
pub fn itemset_to_clauses(itemset: &[String]) -> Result<Vec<Clause>> {
    let mut clauses = itemset
        .iter()
        .map(|item| Clause::from_item(item))
        .collect::<Result<Vec<_>>>()?;
    clauses.sort();
    Ok(clauses)
}

/// Number of classes implied by a label vector: `max(y) + 1`.
pub fn n_labels(y: &[usize]) -> usize {
    y.iter().max().map_or(0, |max| max + 1)
}

/// Mine the candidate pool for `x` and `y`.
///
/// Classes are the dense range `0..=max(y)`, so a class with no rows simply
/// contributes nothing. Itemsets from every class are unioned; the pool is
/// ordered by the sorted clause sequence of each candidate.
pub fn mine_candidates(
    x: &CategoricalMatrix,
    y: &[usize],
    params: &MiningParams,
) -> Result<CandidatePool> {
    if x.n_rows() != y.len() {
        return Err(RuleListError::shape(format!(
            "x has {} rows but y has {} labels",
            x.n_rows(),
            y.len()
        )));
    }

    let miner = params.method.miner();
    let support_pct = params.support_pct();
    let per_label: Vec<Vec<Vec<String>>> = (0..n_labels(y))
        .into_par_iter()
        .map(|label| {
            let rows: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == label)
                .map(|(i, _)| i)
                .collect();
            let transactions = categorical_to_transactions(x, &rows);
            miner.mine(&transactions, support_pct, params.min_len, params.max_len)
        })
        .collect();

    let mut itemsets: BTreeSet<Vec<Clause>> = BTreeSet::new();
    for (label, found) in per_label.iter().enumerate() {
        debug!(label, itemsets = found.len(), "mined class partition");
        for itemset in found {
            itemsets.insert(itemset_to_clauses(itemset)?);
        }
    }

    Ok(CandidatePool::from_itemsets(x, itemsets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_sorted_lists() {
        assert_eq!(intersect(&[0, 2, 4, 6], &[1, 2, 3, 6]), vec![2, 6]);
        assert!(intersect(&[], &[1]).is_empty());
    }

    #[test]
    fn support_count_rounds_up_and_floors_at_one() {
        assert_eq!(min_support_count(5, 10), 1);
        assert_eq!(min_support_count(50, 5), 3);
        assert_eq!(min_support_count(0, 100), 1);
        assert_eq!(min_support_count(100, 7), 7);
    }
}
