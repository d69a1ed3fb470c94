use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

use polars::prelude::*;
use tracing::warn;

use crate::models::polars_err;

pub const TRAINING_POSITIVE_PATH: &str = "./data/Dang.tsv";
pub const TRAINING_NEGATIVE_PATH: &str = "./data/1kg_LoFT.tsv";

/// The training label set: +1 curated haploinsufficient genes, -1 background
/// genes. Genes listed on both sides are inconsistent and excluded.
#[derive(Debug)]
pub struct TrainingLabels {
    pub labels: BTreeMap<String, i32>,
    pub inconsistent: Vec<String>,
    pub raw_positive: usize,
    pub raw_negative: usize,
}

impl TrainingLabels {
    pub fn positive_count(&self) -> usize {
        self.labels.values().filter(|&&l| l == 1).count()
    }

    pub fn negative_count(&self) -> usize {
        self.labels.values().filter(|&&l| l == -1).count()
    }
}

/// Load the curated positive list (2 columns, header skipped) and the
/// background negative list (1 column, no header).
pub fn load_training_labels(
    positive_path: &str,
    negative_path: &str,
) -> PolarsResult<TrainingLabels> {
    let mut labels: BTreeMap<String, i32> = BTreeMap::new();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(positive_path)
        .map_err(|e| polars_err(Box::new(e)))?;

    for record in reader.records() {
        let record = record.map_err(|e| polars_err(Box::new(e)))?;
        let gene = record.get(0).unwrap_or("").trim();
        if gene.is_empty() {
            continue;
        }
        labels.insert(gene.to_string(), 1);
    }
    let raw_positive = labels.len();

    let mut inconsistent = Vec::new();
    let mut raw_negative = 0;

    for gene in load_gene_list(negative_path)? {
        match labels.get(&gene).copied() {
            Some(1) => {
                if !inconsistent.contains(&gene) {
                    inconsistent.push(gene);
                }
            }
            Some(_) => {}
            None => {
                labels.insert(gene, -1);
                raw_negative += 1;
            }
        }
    }

    for gene in &inconsistent {
        labels.remove(gene);
    }

    if !inconsistent.is_empty() {
        warn!(
            "{} gene id(s) appear in both training lists and were excluded",
            inconsistent.len()
        );
    }

    Ok(TrainingLabels {
        labels,
        inconsistent,
        raw_positive,
        raw_negative,
    })
}

/// One gene id per line, no header, blank lines ignored.
pub fn load_gene_list(path: &str) -> PolarsResult<Vec<String>> {
    let file = File::open(path).map_err(|e| {
        PolarsError::ComputeError(format!("failed to open {}: {}", path, e).into())
    })?;

    let mut genes = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| polars_err(Box::new(e)))?;
        let gene = line.trim();
        if !gene.is_empty() {
            genes.push(gene.to_string());
        }
    }

    Ok(genes)
}
