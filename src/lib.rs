//! Co-expression Module Significance Testing Library
//!
//! This library tests whether the internal correlation structure of gene
//! co-expression modules differs between two experimental conditions, and
//! whether it differs from random gene sets of the same size.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (ExpressionMap, ModuleMap, result tables)
//! - **normalize**: Expression preprocessing (log2, quantile, cleaning)
//! - **correlation**: Parallel all-pairs Pearson correlation of a gene set
//! - **test**: Two-sample significance test and permutation null distributions
//! - **pipeline**: Per-module analysis across two conditions
//!
//! # Example
//!
//! ```no_run
//! use coexp_sig::prelude::*;
//!
//! let modules = ModuleMap::from_csv("modules.csv").unwrap();
//! let condition1 = ExpressionMap::from_csv("condition1.csv").unwrap();
//! let condition2 = ExpressionMap::from_csv("condition2.csv").unwrap();
//!
//! let config = AnalysisConfig::new(NullConfig::default().with_seed(42));
//! let results = ModuleAnalysis::new(&modules, &condition1, &condition2, config)
//!     .unwrap()
//!     .run();
//! results.write_dir("output/sigTesting").unwrap();
//! ```

pub mod correlation;
pub mod data;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::correlation::{
        module_correlations, n_pairs, pair_index, partition_pairs, pearson, CorrelationEngine,
    };
    pub use crate::data::{
        ExpressionMap, ModuleComparison, ModuleComparisonSet, ModuleMap, NullComparison,
        NullComparisonSet,
    };
    pub use crate::error::{CoexpError, Result};
    pub use crate::normalize::{clean_nonfinite, norm_log2, norm_quantile};
    pub use crate::pipeline::{
        AnalysisConfig, AnalysisResults, ConditionDistribution, ModuleAnalysis,
        ModuleDistributions,
    };
    pub use crate::test::{
        normal_cdf, null_correlations, test_two_sample, test_two_sample_abs, NullConfig,
        Significance,
    };
}
