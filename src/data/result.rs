//! Result types for module significance testing.

use crate::error::Result;
use crate::test::Significance;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Format a float for the result tables.
fn fmt6(value: f64) -> String {
    format!("{:.6}", value)
}

/// Module-vs-module comparison: condition 1 correlations against condition 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleComparison {
    /// Module label.
    pub module: String,
    /// Number of genes in the module.
    pub size: usize,
    /// Welch t-statistic (positive when condition 1 correlations are higher).
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

impl ModuleComparison {
    /// Create a comparison row from a test result.
    pub fn new(module: impl Into<String>, size: usize, significance: Significance) -> Self {
        Self {
            module: module.into(),
            size,
            statistic: significance.statistic,
            p_value: significance.p_value,
        }
    }

    /// Check if significant at a given threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Module-vs-null comparison for both conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullComparison {
    /// Module label.
    pub module: String,
    /// Number of genes in the module.
    pub size: usize,
    /// Condition 1 actual vs null |correlation| statistic.
    pub c1_statistic: f64,
    /// Condition 1 p-value.
    pub c1_p_value: f64,
    /// Condition 2 actual vs null |correlation| statistic.
    pub c2_statistic: f64,
    /// Condition 2 p-value.
    pub c2_p_value: f64,
}

impl NullComparison {
    /// Create a comparison row from the two per-condition test results.
    pub fn new(
        module: impl Into<String>,
        size: usize,
        condition1: Significance,
        condition2: Significance,
    ) -> Self {
        Self {
            module: module.into(),
            size,
            c1_statistic: condition1.statistic,
            c1_p_value: condition1.p_value,
            c2_statistic: condition2.statistic,
            c2_p_value: condition2.p_value,
        }
    }

    /// Condition 1 test result.
    pub fn condition1(&self) -> Significance {
        Significance {
            statistic: self.c1_statistic,
            p_value: self.c1_p_value,
        }
    }

    /// Condition 2 test result.
    pub fn condition2(&self) -> Significance {
        Significance {
            statistic: self.c2_statistic,
            p_value: self.c2_p_value,
        }
    }
}

/// Module-vs-module results, one row per module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleComparisonSet {
    /// Individual rows in module order.
    pub results: Vec<ModuleComparison>,
}

impl ModuleComparisonSet {
    /// Create a result set.
    pub fn new(results: Vec<ModuleComparison>) -> Self {
        Self { results }
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for a module.
    pub fn get(&self, module: &str) -> Option<&ModuleComparison> {
        self.results.iter().find(|r| r.module == module)
    }

    /// Rows sorted by p-value (ascending).
    pub fn sorted_by_pvalue(&self) -> Vec<&ModuleComparison> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
        sorted
    }

    /// Rows significant at a threshold.
    pub fn significant_at(&self, alpha: f64) -> Vec<&ModuleComparison> {
        self.results
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .collect()
    }

    /// Write the table to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file)
    }

    /// Write the table as CSV (`Module,Size,T-Statistic,P-Value`).
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["Module", "Size", "T-Statistic", "P-Value"])?;
        for r in &self.results {
            csv_writer.write_record([
                r.module.clone(),
                r.size.to_string(),
                fmt6(r.statistic),
                fmt6(r.p_value),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleComparison> {
        self.results.iter()
    }
}

/// Module-vs-null results, one row per module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NullComparisonSet {
    /// Individual rows in module order.
    pub results: Vec<NullComparison>,
}

impl NullComparisonSet {
    /// Create a result set.
    pub fn new(results: Vec<NullComparison>) -> Self {
        Self { results }
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for a module.
    pub fn get(&self, module: &str) -> Option<&NullComparison> {
        self.results.iter().find(|r| r.module == module)
    }

    /// Write the table to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file)
    }

    /// Write the table as CSV
    /// (`Module,Size,C1_T-Stat,C1_P-Value,C2_T-Stat,C2_P-Value`).
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "Module",
            "Size",
            "C1_T-Stat",
            "C1_P-Value",
            "C2_T-Stat",
            "C2_P-Value",
        ])?;
        for r in &self.results {
            csv_writer.write_record([
                r.module.clone(),
                r.size.to_string(),
                fmt6(r.c1_statistic),
                fmt6(r.c1_p_value),
                fmt6(r.c2_statistic),
                fmt6(r.c2_p_value),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &NullComparison> {
        self.results.iter()
    }
}
