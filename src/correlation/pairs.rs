//! Linear indexing of unordered element pairs.
//!
//! The pairs `{(i, j) : 0 <= i < j < n}` are numbered in row-major order of
//! the upper triangle, i.e. the order of
//!
//! ```text
//! for i in 0..n { for j in i + 1..n { ... } }
//! ```
//!
//! [`pair_index`] inverts that numbering in constant time, so the pair space
//! can be cut into contiguous index ranges and handed to independent workers.

use std::ops::Range;

/// Number of unordered pairs among `n` elements, `n * (n - 1) / 2`.
pub fn n_pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Largest `r` with `r * (r + 1) / 2 <= k`.
fn triangular_root(k: usize) -> usize {
    let mut r = (((8.0 * k as f64 + 1.0).sqrt() - 1.0) / 2.0) as usize;
    // Correct float rounding for large k.
    while r * (r + 1) / 2 > k {
        r -= 1;
    }
    while (r + 1) * (r + 2) / 2 <= k {
        r += 1;
    }
    r
}

/// Map a linear pair index to its pair `(i, j)`, `i < j < n`.
///
/// `idx` must be below [`n_pairs(n)`](n_pairs). Counting from the end of the
/// pair space, the trailing rows form triangular numbers (row `n - 2` holds
/// one pair, row `n - 3` two, ...), so the row is found with the inverse
/// triangular-number formula on the reversed index.
pub fn pair_index(idx: usize, n: usize) -> (usize, usize) {
    debug_assert!(idx < n_pairs(n), "pair index {} out of range for n = {}", idx, n);
    let k = n_pairs(n) - 1 - idx;
    let r = triangular_root(k);
    let i = n - 2 - r;
    let j = n - 1 - (k - r * (r + 1) / 2);
    (i, j)
}

/// Split `[0, total)` into at most `workers` contiguous, non-empty ranges.
///
/// Each range holds `total / workers` indices (at least one); the last range
/// absorbs the remainder. Together the ranges cover every index exactly once.
pub fn partition_pairs(total: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let per_worker = (total / workers).max(1);

    let mut ranges = Vec::with_capacity(workers.min(total));
    let mut start = 0;
    for w in 0..workers {
        if start >= total {
            break;
        }
        let end = if w == workers - 1 {
            total
        } else {
            (start + per_worker).min(total)
        };
        ranges.push(start..end);
        start = end;
    }
    ranges
}
