//! Per-module significance testing across two conditions.

use crate::correlation::CorrelationEngine;
use crate::data::{
    ExpressionMap, ModuleComparison, ModuleComparisonSet, ModuleMap, NullComparison,
    NullComparisonSet,
};
use crate::error::{CoexpError, Result};
use crate::test::{null_correlations, test_two_sample, test_two_sample_abs, NullConfig, Significance};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Analysis configuration for serialization.
///
/// The null sampling keys (`n_permutations`, `seed`, `workers`) sit at the
/// top level of the YAML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Null sampling settings shared by every module and condition.
    #[serde(flatten)]
    pub null: NullConfig,
}

impl AnalysisConfig {
    /// Create a configuration from null sampling settings.
    pub fn new(null: NullConfig) -> Self {
        Self { null }
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(CoexpError::from)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(CoexpError::from)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.null.workers == Some(0) {
            return Err(CoexpError::InvalidParameter(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mix a stream index into a seed (splitmix64 finalizer).
fn derive_seed(base: u64, stream: u64) -> u64 {
    let mut z = base.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Both result tables of a full analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Condition 1 vs condition 2 correlations, per module.
    pub module_vs_module: ModuleComparisonSet,
    /// Actual vs null |correlations|, per module and condition.
    pub module_vs_null: NullComparisonSet,
}

impl AnalysisResults {
    /// Write `module_correlation_results.csv` and
    /// `null_distribution_results.csv` into a directory, creating it if needed.
    pub fn write_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.module_vs_module
            .to_csv(dir.join("module_correlation_results.csv"))?;
        self.module_vs_null
            .to_csv(dir.join("null_distribution_results.csv"))?;
        Ok(())
    }

    /// Serialize both tables as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write both tables to a single JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Actual and null correlations of one module in one condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDistribution {
    /// Within-module correlations.
    pub actual: Vec<f64>,
    /// Pooled correlations of random gene sets of the same size.
    pub null: Vec<f64>,
    /// Actual vs null |correlation| test.
    pub significance: Significance,
}

/// Correlation distributions of one module in both conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDistributions {
    /// Module label.
    pub module: String,
    /// Number of genes in the module.
    pub size: usize,
    /// Condition 1 distributions.
    pub condition1: ConditionDistribution,
    /// Condition 2 distributions.
    pub condition2: ConditionDistribution,
}

impl ModuleDistributions {
    /// Write the distributions to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file)
    }

    /// Write long-format CSV: `condition,source,correlation`.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["condition", "source", "correlation"])?;
        for (name, dist) in [("condition1", &self.condition1), ("condition2", &self.condition2)] {
            for (source, values) in [("module", &dist.actual), ("null", &dist.null)] {
                for r in values {
                    csv_writer.write_record([name, source, r.to_string().as_str()])?;
                }
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Actual correlations of one module in both conditions.
struct ModuleCorrelations<'m> {
    module: &'m str,
    size: usize,
    condition1: Vec<f64>,
    condition2: Vec<f64>,
}

impl ModuleCorrelations<'_> {
    /// Raw condition 1 vs condition 2 test.
    fn compare_conditions(&self) -> ModuleComparison {
        ModuleComparison::new(
            self.module,
            self.size,
            test_two_sample(&self.condition1, &self.condition2),
        )
    }
}

/// Significance testing of every module in a module map.
///
/// For each module label, in order of first appearance:
///
/// - **module vs module**: condition 1 correlations against condition 2
///   correlations, on raw values
/// - **module vs null**: for each condition, the module's correlations
///   against correlations of random gene sets of the same size drawn from
///   that condition's genes, on absolute values
///
/// Every module yields a row in each table; degenerate modules carry the
/// (0, 1) sentinel.
#[derive(Debug, Clone)]
pub struct ModuleAnalysis<'a> {
    modules: &'a ModuleMap,
    condition1: &'a ExpressionMap,
    condition2: &'a ExpressionMap,
    config: AnalysisConfig,
    engine: CorrelationEngine,
    seed: u64,
}

impl<'a> ModuleAnalysis<'a> {
    /// Create an analysis over borrowed inputs.
    pub fn new(
        modules: &'a ModuleMap,
        condition1: &'a ExpressionMap,
        condition2: &'a ExpressionMap,
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        let engine = CorrelationEngine::new(config.null.n_workers());
        let seed = config.null.resolve_seed();
        Ok(Self {
            modules,
            condition1,
            condition2,
            config,
            engine,
            seed,
        })
    }

    /// Null sampling settings for one module (by position) and condition.
    fn null_config(&self, module_idx: usize, condition: u64) -> NullConfig {
        NullConfig {
            seed: Some(derive_seed(self.seed, 2 * module_idx as u64 + condition)),
            ..self.config.null.clone()
        }
    }

    /// Null comparison for one condition, or the sentinel when the module is
    /// larger than the condition's gene universe.
    fn condition_distribution(
        &self,
        module: &str,
        size: usize,
        actual: Vec<f64>,
        expression: &ExpressionMap,
        null_config: &NullConfig,
    ) -> ConditionDistribution {
        match null_correlations(expression.gene_ids(), expression, size, null_config) {
            Ok(null) => {
                let significance = test_two_sample_abs(&actual, &null);
                ConditionDistribution {
                    actual,
                    null,
                    significance,
                }
            }
            Err(e) => {
                warn!(module, "null distribution skipped: {}", e);
                ConditionDistribution {
                    actual,
                    null: Vec::new(),
                    significance: Significance::NONE,
                }
            }
        }
    }

    /// Within-module correlations of one module in both conditions.
    fn correlate<'m>(&self, module: &'m str) -> ModuleCorrelations<'m> {
        let genes = self.modules.genes_in(module);
        ModuleCorrelations {
            module,
            size: genes.len(),
            condition1: self.engine.correlations(&genes, self.condition1),
            condition2: self.engine.correlations(&genes, self.condition2),
        }
    }

    /// Null distributions of one module in both conditions.
    fn sample_null(&self, module_idx: usize, corrs: ModuleCorrelations<'_>) -> ModuleDistributions {
        let ModuleCorrelations {
            module,
            size,
            condition1,
            condition2,
        } = corrs;
        let condition1 = self.condition_distribution(
            module,
            size,
            condition1,
            self.condition1,
            &self.null_config(module_idx, 0),
        );
        let condition2 = self.condition_distribution(
            module,
            size,
            condition2,
            self.condition2,
            &self.null_config(module_idx, 1),
        );
        info!(
            module,
            size,
            c1_p = condition1.significance.p_value,
            c2_p = condition2.significance.p_value,
            "sampled module null"
        );
        ModuleDistributions {
            module: module.to_string(),
            size,
            condition1,
            condition2,
        }
    }

    /// Condition 1 vs condition 2 for every module.
    pub fn module_vs_module(&self) -> ModuleComparisonSet {
        let results = self
            .modules
            .labels()
            .into_iter()
            .map(|module| self.correlate(module).compare_conditions())
            .collect();
        ModuleComparisonSet::new(results)
    }

    /// Actual vs null in each condition for every module.
    pub fn module_vs_null(&self) -> NullComparisonSet {
        let results = self
            .modules
            .labels()
            .into_iter()
            .enumerate()
            .map(|(idx, module)| Self::null_row(&self.sample_null(idx, self.correlate(module))))
            .collect();
        NullComparisonSet::new(results)
    }

    fn null_row(dist: &ModuleDistributions) -> NullComparison {
        NullComparison::new(
            dist.module.as_str(),
            dist.size,
            dist.condition1.significance,
            dist.condition2.significance,
        )
    }

    /// Actual and null correlation distributions of a single module.
    pub fn distributions(&self, module: &str) -> Result<ModuleDistributions> {
        let idx = self
            .modules
            .labels()
            .iter()
            .position(|m| *m == module)
            .ok_or_else(|| CoexpError::UnknownModule(module.to_string()))?;
        Ok(self.sample_null(idx, self.correlate(module)))
    }

    /// Run both comparisons for every module.
    pub fn run(&self) -> AnalysisResults {
        let labels = self.modules.labels();
        info!(
            n_modules = labels.len(),
            n_permutations = self.config.null.n_permutations,
            seed = self.seed,
            "running module analysis"
        );

        let mut module_vs_module = Vec::with_capacity(labels.len());
        let mut module_vs_null = Vec::with_capacity(labels.len());
        for (idx, module) in labels.into_iter().enumerate() {
            let corrs = self.correlate(module);
            let between = corrs.compare_conditions();
            info!(module, t = between.statistic, p = between.p_value, "compared conditions");
            module_vs_module.push(between);
            module_vs_null.push(Self::null_row(&self.sample_null(idx, corrs)));
        }

        AnalysisResults {
            module_vs_module: ModuleComparisonSet::new(module_vs_module),
            module_vs_null: NullComparisonSet::new(module_vs_null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_data() -> (ModuleMap, ExpressionMap, ExpressionMap) {
        let modules: ModuleMap = [("g1", "M1"), ("g2", "M1"), ("g3", "M1"), ("g4", "M2")]
            .into_iter()
            .collect();
        let c1 = ExpressionMap::new(vec![
            ("g1".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
            ("g2".to_string(), vec![2.0, 4.0, 6.0, 8.0]),
            ("g3".to_string(), vec![1.0, 1.0, 1.0, 1.0]),
            ("g4".to_string(), vec![3.0, 1.0, 2.0, 5.0]),
            ("g5".to_string(), vec![0.3, 0.1, 0.4, 0.2]),
        ])
        .unwrap();
        let c2 = ExpressionMap::new(vec![
            ("g1".to_string(), vec![4.0, 1.0, 3.0, 2.0]),
            ("g2".to_string(), vec![1.0, 3.0, 2.0, 4.0]),
            ("g3".to_string(), vec![2.0, 2.0, 1.0, 3.0]),
            ("g4".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
        ])
        .unwrap();
        (modules, c1, c2)
    }

    fn quick_config() -> AnalysisConfig {
        AnalysisConfig::new(NullConfig {
            n_permutations: 20,
            seed: Some(42),
            workers: Some(2),
        })
    }

    #[test]
    fn test_one_row_per_module() {
        let (modules, c1, c2) = create_test_data();
        let analysis = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap();
        let results = analysis.run();

        assert_eq!(results.module_vs_module.len(), 2);
        assert_eq!(results.module_vs_null.len(), 2);
        let labels: Vec<&str> = results.module_vs_module.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(labels, vec!["M1", "M2"]);
        assert_eq!(results.module_vs_module.get("M1").unwrap().size, 3);
    }

    #[test]
    fn test_degenerate_module_gets_sentinel() {
        let (modules, c1, c2) = create_test_data();
        let analysis = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap();
        let results = analysis.run();

        // M1 has a single valid correlation in condition 1.
        let m1 = results.module_vs_module.get("M1").unwrap();
        assert_eq!((m1.statistic, m1.p_value), (0.0, 1.0));

        // M2 has one gene, so no correlations at all.
        let m2 = results.module_vs_null.get("M2").unwrap();
        assert_eq!(m2.condition1(), Significance::NONE);
        assert_eq!(m2.condition2(), Significance::NONE);
    }

    #[test]
    fn test_module_larger_than_universe() {
        let modules: ModuleMap = (1..=5).map(|g| (format!("g{}", g), "M1")).collect();
        let (_, c1, c2) = create_test_data();
        let analysis = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap();
        let dist = analysis.distributions("M1").unwrap();

        // Condition 2 has only four genes.
        assert!(dist.condition2.null.is_empty());
        assert_eq!(dist.condition2.significance, Significance::NONE);
        assert!(!dist.condition1.null.is_empty());
    }

    #[test]
    fn test_unknown_module() {
        let (modules, c1, c2) = create_test_data();
        let analysis = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap();
        assert!(matches!(
            analysis.distributions("M9"),
            Err(CoexpError::UnknownModule(m)) if m == "M9"
        ));
    }

    #[test]
    fn test_run_matches_separate_tables() {
        let (modules, c1, c2) = create_test_data();
        let analysis = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap();
        let results = analysis.run();
        let between = analysis.module_vs_module();
        let null = analysis.module_vs_null();

        for (a, b) in results.module_vs_module.iter().zip(between.iter()) {
            assert_eq!(a, b);
        }
        for (a, b) in results.module_vs_null.iter().zip(null.iter()) {
            assert_eq!(a.module, b.module);
            assert!((a.c1_p_value - b.c1_p_value).abs() < 1e-9);
            assert!((a.c2_p_value - b.c2_p_value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_runs_agree() {
        let (modules, c1, c2) = create_test_data();
        let first = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap().run();
        let second = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap().run();
        for (a, b) in first.module_vs_null.iter().zip(second.module_vs_null.iter()) {
            assert!((a.c1_p_value - b.c1_p_value).abs() < 1e-9);
            assert!((a.c2_p_value - b.c2_p_value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_results_json() {
        let (modules, c1, c2) = create_test_data();
        let results = ModuleAnalysis::new(&modules, &c1, &c2, quick_config())
            .unwrap()
            .run();
        let json = results.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["module_vs_module"]["results"].as_array().unwrap().len(),
            results.module_vs_module.len()
        );
    }

    #[test]
    fn test_config_yaml() {
        let config = AnalysisConfig::from_yaml("n_permutations: 250\nseed: 7\n").unwrap();
        assert_eq!(config.null.n_permutations, 250);
        assert_eq!(config.null.seed, Some(7));
        assert_eq!(config.null.workers, None);
        assert!(config.to_yaml().unwrap().starts_with("n_permutations: 250"));

        let yaml = config.to_yaml().unwrap();
        assert_eq!(AnalysisConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let (modules, c1, c2) = create_test_data();
        let mut config = quick_config();
        config.null.workers = Some(0);
        assert!(matches!(
            ModuleAnalysis::new(&modules, &c1, &c2, config),
            Err(CoexpError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_derive_seed_distinct_streams() {
        let a = derive_seed(42, 0);
        let b = derive_seed(42, 1);
        let c = derive_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_seed(42, 0));
    }

    #[test]
    fn test_distributions_csv() {
        let (modules, c1, c2) = create_test_data();
        let analysis = ModuleAnalysis::new(&modules, &c1, &c2, quick_config()).unwrap();
        let dist = analysis.distributions("M1").unwrap();

        let mut buffer = Vec::new();
        dist.to_writer(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("condition,source,correlation"));

        let n_rows = text.lines().count() - 1;
        let expected = dist.condition1.actual.len()
            + dist.condition1.null.len()
            + dist.condition2.actual.len()
            + dist.condition2.null.len();
        assert_eq!(n_rows, expected);
        assert!(text.contains("condition1,module,1"));
    }
}
