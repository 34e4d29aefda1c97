//! Module discovery and analysis orchestration.

mod runner;

pub use runner::{
    AnalysisConfig, AnalysisResults, ConditionDistribution, ModuleAnalysis, ModuleDistributions,
};
