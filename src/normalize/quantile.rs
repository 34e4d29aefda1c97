//! Quantile normalization across samples.

use crate::data::ExpressionMap;
use crate::error::{CoexpError, Result};
use rayon::prelude::*;

/// Quantile-normalize sample columns so they share one distribution.
///
/// Each sample column is ranked, the reference distribution is the mean of
/// the sorted columns at each rank, and every value is replaced by the
/// reference value of its rank. Tied values receive the mean reference value
/// of their tie block.
///
/// Only the first [`min_samples`](ExpressionMap::min_samples) columns take
/// part; longer profiles are truncated.
pub fn norm_quantile(expression: &ExpressionMap) -> Result<ExpressionMap> {
    let n_genes = expression.len();
    let n_samples = expression.min_samples();
    if n_genes == 0 || n_samples == 0 {
        return Err(CoexpError::EmptyData(
            "Cannot quantile-normalize an empty expression map".to_string(),
        ));
    }

    let rows: Vec<&[f64]> = expression.iter().map(|(_, v)| &v[..n_samples]).collect();

    // Gene indices of each column in ascending value order.
    let orders: Vec<Vec<usize>> = (0..n_samples)
        .into_par_iter()
        .map(|j| {
            let mut order: Vec<usize> = (0..n_genes).collect();
            order.sort_by(|&a, &b| rows[a][j].total_cmp(&rows[b][j]));
            order
        })
        .collect();

    let reference: Vec<f64> = (0..n_genes)
        .map(|rank| {
            let sum: f64 = orders
                .iter()
                .enumerate()
                .map(|(j, order)| rows[order[rank]][j])
                .sum();
            sum / n_samples as f64
        })
        .collect();

    let mut normalized = vec![vec![0.0; n_samples]; n_genes];
    for (j, order) in orders.iter().enumerate() {
        let mut start = 0;
        while start < n_genes {
            let value = rows[order[start]][j];
            let mut end = start + 1;
            while end < n_genes && rows[order[end]][j] == value {
                end += 1;
            }
            let tied_mean = reference[start..end].iter().sum::<f64>() / (end - start) as f64;
            for &gene in &order[start..end] {
                normalized[gene][j] = tied_mean;
            }
            start = end;
        }
    }

    let result_rows = expression
        .gene_ids()
        .iter()
        .cloned()
        .zip(normalized)
        .collect();
    let sample_ids = expression
        .sample_ids()
        .iter()
        .take(n_samples)
        .cloned()
        .collect();
    ExpressionMap::with_sample_ids(result_rows, sample_ids)
}
