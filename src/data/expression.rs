//! Gene expression profiles keyed by gene identifier.

use crate::error::{CoexpError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

/// Expression measurements for one condition: gene id → sample vector.
///
/// Genes keep their insertion order, which is also the order used when the
/// map serves as a sampling universe. Vectors may differ in length; the
/// common usable length ([`min_samples`](Self::min_samples)) is the shortest
/// vector across *all* genes and is computed once at construction.
#[derive(Debug, Clone, Default)]
pub struct ExpressionMap {
    gene_ids: Vec<String>,
    values: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
    sample_ids: Vec<String>,
    min_samples: usize,
}

impl ExpressionMap {
    /// Build a map from `(gene, samples)` rows.
    ///
    /// Sample columns are named `sample_1..sample_k` after the longest row.
    pub fn new(rows: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let max_len = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let sample_ids = (1..=max_len).map(|k| format!("sample_{}", k)).collect();
        Self::with_sample_ids(rows, sample_ids)
    }

    /// Build a map with explicit sample column names.
    pub fn with_sample_ids(rows: Vec<(String, Vec<f64>)>, sample_ids: Vec<String>) -> Result<Self> {
        let mut gene_ids = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());

        for (gene, samples) in rows {
            if index.contains_key(&gene) {
                return Err(CoexpError::DuplicateGene(gene));
            }
            index.insert(gene.clone(), gene_ids.len());
            gene_ids.push(gene);
            values.push(samples);
        }

        let min_samples = values.iter().map(Vec::len).min().unwrap_or(0);

        Ok(Self {
            gene_ids,
            values,
            index,
            sample_ids,
            min_samples,
        })
    }

    /// Load an expression matrix from a CSV file.
    ///
    /// Expected format:
    /// - First row: header (first column names the gene column, the rest are sample ids)
    /// - Subsequent rows: gene id followed by sample values
    ///
    /// Values that fail to parse are read as 0.0. Rows with no sample
    /// fields are skipped.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load an expression matrix from any CSV reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let sample_ids: Vec<String> = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(|s| s.trim().to_string())
            .collect();

        let mut rows: Vec<(String, Vec<f64>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut n_malformed = 0usize;
        let mut n_duplicates = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            let Some(gene) = record.get(0) else {
                continue;
            };
            let samples: Vec<f64> = record
                .iter()
                .skip(1)
                .map(|field| {
                    field.trim().parse::<f64>().unwrap_or_else(|_| {
                        n_malformed += 1;
                        0.0
                    })
                })
                .collect();
            if samples.is_empty() {
                continue;
            }
            let gene = gene.trim().to_string();
            match positions.get(&gene) {
                // Repeated ids keep the first position and the last values.
                Some(&pos) => {
                    n_duplicates += 1;
                    rows[pos].1 = samples;
                }
                None => {
                    positions.insert(gene.clone(), rows.len());
                    rows.push((gene, samples));
                }
            }
        }

        if rows.is_empty() {
            return Err(CoexpError::EmptyData("No genes in expression file".to_string()));
        }
        if n_malformed > 0 {
            warn!(n_malformed, "non-numeric expression values read as 0.0");
        }
        if n_duplicates > 0 {
            warn!(n_duplicates, "repeated gene ids replaced by their last row");
        }

        let map = Self::with_sample_ids(rows, sample_ids)?;
        debug!(
            n_genes = map.len(),
            min_samples = map.min_samples(),
            "loaded expression map"
        );
        Ok(map)
    }

    /// Write the expression matrix to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file)
    }

    /// Write the expression matrix as CSV to any writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

        let mut header = Vec::with_capacity(self.sample_ids.len() + 1);
        header.push("gene".to_string());
        header.extend(self.sample_ids.iter().cloned());
        csv_writer.write_record(&header)?;

        for (gene, samples) in self.iter() {
            let mut record = Vec::with_capacity(samples.len() + 1);
            record.push(gene.to_string());
            record.extend(samples.iter().map(|v| v.to_string()));
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.gene_ids.len()
    }

    /// Check if the map holds no genes.
    pub fn is_empty(&self) -> bool {
        self.gene_ids.is_empty()
    }

    /// Gene identifiers in insertion order.
    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    /// Sample column names.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Shortest sample vector across all genes.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Check whether a gene is present.
    pub fn contains(&self, gene: &str) -> bool {
        self.index.contains_key(gene)
    }

    /// Full sample vector for a gene.
    pub fn get(&self, gene: &str) -> Option<&[f64]> {
        self.index.get(gene).map(|&i| self.values[i].as_slice())
    }

    /// Sample vector truncated to [`min_samples`](Self::min_samples).
    pub fn truncated(&self, gene: &str) -> Option<&[f64]> {
        self.get(gene).map(|v| &v[..self.min_samples])
    }

    /// Iterate over `(gene, samples)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.gene_ids
            .iter()
            .zip(self.values.iter())
            .map(|(g, v)| (g.as_str(), v.as_slice()))
    }

    /// Apply a function to every gene's sample vector, keeping ids and order.
    pub fn map_rows<F>(&self, f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let values: Vec<Vec<f64>> = self.values.iter().map(|v| f(v)).collect();
        let min_samples = values.iter().map(Vec::len).min().unwrap_or(0);
        Self {
            gene_ids: self.gene_ids.clone(),
            values,
            index: self.index.clone(),
            sample_ids: self.sample_ids.clone(),
            min_samples,
        }
    }

    /// Extract a contiguous block of sample columns from every gene.
    ///
    /// The range must lie within the common usable length.
    pub fn select_samples(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end {
            return Err(CoexpError::InvalidParameter(format!(
                "Sample range {}..{} is reversed",
                range.start, range.end
            )));
        }
        if range.end > self.min_samples {
            return Err(CoexpError::SampleIndexOutOfRange {
                index: range.end - 1,
                n_samples: self.min_samples,
            });
        }

        let mut selected = self.map_rows(|v| v[range.clone()].to_vec());
        selected.sample_ids = self
            .sample_ids
            .get(range.clone())
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| range.map(|k| format!("sample_{}", k + 1)).collect());
        Ok(selected)
    }
}
