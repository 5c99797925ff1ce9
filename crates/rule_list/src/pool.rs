use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataframe::CategoricalMatrix;
use crate::rules::{Clause, Predicate, Rule};

/// A candidate antecedent: parallel feature and category lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub features: Vec<usize>,
    pub categories: Vec<i64>,
}

impl Candidate {
    pub fn from_clauses(clauses: &[Clause]) -> Self {
        let (features, categories) = clauses
            .iter()
            .map(|clause| (clause.feature_idx, clause.category))
            .unzip();
        Candidate {
            features,
            categories,
        }
    }

    pub fn clauses(&self) -> Vec<Clause> {
        self.features
            .iter()
            .zip(&self.categories)
            .map(|(&feature_idx, &category)| Clause::new(feature_idx, category))
            .collect()
    }

    pub fn is_default(&self) -> bool {
        self.features.is_empty()
    }

    /// Brace form written to the trainer's data file, e.g. `{0=1,3=2}`.
    pub fn item_str(&self) -> String {
        format!("{{{}}}", self.clauses().iter().map(Clause::item).join(","))
    }

    /// Build a rule from this antecedent and a trainer output row.
    pub fn to_rule(&self, output: Vec<f64>) -> Rule {
        Rule::new(self.clauses(), output)
    }
}

/// Deduplicated candidate antecedents of one fit.
///
/// Index 0 is the implicit default candidate; mined candidates follow in the
/// order they were supplied. Each entry carries its satisfaction mask over the
/// training rows.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    masks: Vec<Vec<bool>>,
    n_samples: usize,
}

impl CandidatePool {
    pub fn from_itemsets<I>(x: &CategoricalMatrix, itemsets: I) -> Self
    where
        I: IntoIterator<Item = Vec<Clause>>,
    {
        let mut candidates = vec![Candidate::default()];
        candidates.extend(
            itemsets
                .into_iter()
                .map(|clauses| Candidate::from_clauses(&clauses)),
        );

        // Each candidate's mask is independent of the others
        let masks = candidates
            .par_iter()
            .map(|candidate| Rule::new(candidate.clauses(), Vec::new()).evaluate(x))
            .collect();

        CandidatePool {
            candidates,
            masks,
            n_samples: x.n_rows(),
        }
    }

    /// Number of entries including the default candidate.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.len() <= 1
    }

    /// Number of mined candidates, i.e. excluding the default.
    pub fn n_mined(&self) -> usize {
        self.candidates.len() - 1
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn get(&self, id: usize) -> Option<&Candidate> {
        self.candidates.get(id)
    }

    pub fn mask(&self, id: usize) -> Option<&[bool]> {
        self.masks.get(id).map(Vec::as_slice)
    }

    /// Mined candidates with their masks, in pool order starting at id 1.
    pub fn mined(&self) -> impl Iterator<Item = (&Candidate, &[bool])> + '_ {
        self.candidates
            .iter()
            .zip(&self.masks)
            .skip(1)
            .map(|(candidate, mask)| (candidate, mask.as_slice()))
    }
}
