//! All-pairs correlation of a gene set, partitioned across workers.

use super::pairs::{n_pairs, pair_index, partition_pairs};
use super::pearson::pearson;
use crate::data::ExpressionMap;
use rayon::prelude::*;
use tracing::trace;

/// Computes the pairwise correlation vector of a gene set.
///
/// The pair space `[0, n * (n - 1) / 2)` is cut into at most `workers`
/// contiguous ranges. Each range runs as one rayon task with a local buffer
/// and the buffers are concatenated once every task has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationEngine {
    workers: usize,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(rayon::current_num_threads())
    }
}

impl CorrelationEngine {
    /// Create an engine splitting work into `workers` ranges (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of work ranges.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Pearson correlation for every unordered pair of `genes`.
    ///
    /// Sample vectors are truncated to the map-wide
    /// [`min_samples`](ExpressionMap::min_samples). Pairs involving a gene
    /// absent from `expression`, and NaN correlations, are dropped. Duplicate
    /// gene ids are not merged; each occurrence is paired independently.
    ///
    /// The result is an unordered multiset: its order depends on the worker
    /// layout.
    pub fn correlations<S>(&self, genes: &[S], expression: &ExpressionMap) -> Vec<f64>
    where
        S: AsRef<str> + Sync,
    {
        let n = genes.len();
        let total = n_pairs(n);
        if total == 0 {
            return Vec::new();
        }

        let profiles: Vec<Option<&[f64]>> = genes
            .iter()
            .map(|g| expression.truncated(g.as_ref()))
            .collect();

        let ranges = partition_pairs(total, self.workers);
        let correlations = ranges
            .into_par_iter()
            .map(|range| {
                let mut local = Vec::with_capacity(range.len());
                for idx in range {
                    let (i, j) = pair_index(idx, n);
                    if let (Some(x), Some(y)) = (profiles[i], profiles[j]) {
                        let r = pearson(x, y);
                        if !r.is_nan() {
                            local.push(r);
                        }
                    }
                }
                local
            })
            .reduce(Vec::new, |mut acc, local| {
                acc.extend(local);
                acc
            });

        trace!(
            n_genes = n,
            n_pairs = total,
            n_valid = correlations.len(),
            "computed module correlations"
        );
        correlations
    }
}

/// Pairwise correlations with the default engine.
pub fn module_correlations<S>(genes: &[S], expression: &ExpressionMap) -> Vec<f64>
where
    S: AsRef<str> + Sync,
{
    CorrelationEngine::default().correlations(genes, expression)
}
