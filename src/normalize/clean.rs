//! Replacement of non-finite expression values.

use crate::data::ExpressionMap;

/// Replace NaN and infinite values with the mean of the gene's finite values.
///
/// A gene with no finite values is filled with 0.0.
pub fn clean_nonfinite(expression: &ExpressionMap) -> ExpressionMap {
    expression.map_rows(|row| {
        let finite: Vec<f64> = row.iter().copied().filter(|v| v.is_finite()).collect();
        let mean = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };
        row.iter()
            .map(|&v| if v.is_finite() { v } else { mean })
            .collect()
    })
}
