//! Log2 transformation of expression values.

use crate::data::ExpressionMap;

/// Apply `log2(x + 1)` to every expression value.
///
/// Values at or below -1 become `-inf` or NaN; run
/// [`clean_nonfinite`](super::clean_nonfinite) afterwards for such data.
pub fn norm_log2(expression: &ExpressionMap) -> ExpressionMap {
    expression.map_rows(|row| row.iter().map(|&x| (x + 1.0).log2()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log2_values() {
        let expr = ExpressionMap::new(vec![
            ("g1".to_string(), vec![0.0, 1.0, 3.0, 7.0]),
            ("g2".to_string(), vec![15.0, 255.0]),
        ])
        .unwrap();

        let logged = norm_log2(&expr);
        assert_eq!(logged.get("g1"), Some(&[0.0, 1.0, 2.0, 3.0][..]));
        assert_relative_eq!(logged.get("g2").unwrap()[1], 8.0, epsilon = 1e-12);
        assert_eq!(logged.min_samples(), 2);
        assert_eq!(logged.gene_ids(), expr.gene_ids());
    }
}
