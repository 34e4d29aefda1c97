//! Statistical hypothesis testing for module correlation structure.

pub mod ttest;

pub use null::{null_correlations, worker_seed, NullConfig};
pub use ttest::{normal_cdf, test_two_sample, test_two_sample_abs, Significance};
