//! Gene to module assignments.

use crate::error::{CoexpError, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Assignment of genes to module labels, in insertion order.
///
/// Iteration order is stable, so the gene list of a module and the order of
/// distinct labels are reproducible between runs.
#[derive(Debug, Clone, Default)]
pub struct ModuleMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ModuleMap {
    /// Create an empty module map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a gene to a module. Reassigning keeps the gene's position.
    pub fn insert(&mut self, gene: impl Into<String>, module: impl Into<String>) {
        let gene = gene.into();
        let module = module.into();
        match self.index.get(&gene) {
            Some(&i) => self.entries[i].1 = module,
            None => {
                self.index.insert(gene.clone(), self.entries.len());
                self.entries.push((gene, module));
            }
        }
    }

    /// Load module assignments from a CSV file.
    ///
    /// Expected format: a header row, then `gene,module` rows. Extra columns
    /// are ignored and rows with fewer than two columns are skipped.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load module assignments from any CSV reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut map = Self::new();
        for record in csv_reader.records() {
            let record = record?;
            if let (Some(gene), Some(module)) = (record.get(0), record.get(1)) {
                map.insert(gene.trim(), module.trim());
            }
        }

        if map.is_empty() {
            return Err(CoexpError::EmptyData("No genes in module file".to_string()));
        }
        debug!(n_genes = map.len(), n_modules = map.labels().len(), "loaded module map");
        Ok(map)
    }

    /// Number of assigned genes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no genes are assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Module label of a gene.
    pub fn module_of(&self, gene: &str) -> Option<&str> {
        self.index.get(gene).map(|&i| self.entries[i].1.as_str())
    }

    /// Distinct module labels in order of first appearance.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|(_, m)| m.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }

    /// Check whether any gene carries the given label.
    pub fn contains_module(&self, module: &str) -> bool {
        self.entries.iter().any(|(_, m)| m == module)
    }

    /// Genes assigned to a module, in insertion order.
    pub fn genes_in(&self, module: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, m)| m == module)
            .map(|(g, _)| g.as_str())
            .collect()
    }

    /// Iterate over `(gene, module)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(g, m)| (g.as_str(), m.as_str()))
    }
}

impl<G: Into<String>, M: Into<String>> FromIterator<(G, M)> for ModuleMap {
    fn from_iter<I: IntoIterator<Item = (G, M)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (gene, module) in iter {
            map.insert(gene, module);
        }
        map
    }
}
