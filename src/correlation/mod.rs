//! Pairwise gene correlation.
//!
//! - **pearson**: the correlation primitive
//! - **pairs**: linear pair indexing and work partitioning
//! - **engine**: parallel all-pairs correlation of a gene set

pub mod engine;
pub mod pairs;
pub mod pearson;

pub use engine::{module_correlations, CorrelationEngine};
pub use pairs::{n_pairs, pair_index, partition_pairs};
pub use pearson::pearson;
