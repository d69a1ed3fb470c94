use std::collections::{BTreeSet, HashMap};
use std::fs::{create_dir_all, File};
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::data_handling::sources::ResolvedSource;
use crate::helper_functions::read_tsv;
use crate::models::{polars_err, Source};

pub const GENE_COLUMN: &str = "gene";

/// The merged score table: one row per gene (union of all sources), one
/// column per source, missing where a source lacks the gene. Created once by
/// the merge stage and immutable downstream.
#[derive(Debug)]
pub struct MergedTable {
    pub genes: Vec<String>,
    /// Per-source scores aligned with `genes`, in `Source::ALL` order.
    pub columns: Vec<(Source, Vec<Option<f64>>)>,
}

impl MergedTable {
    pub fn from_sources(resolved: &[ResolvedSource]) -> MergedTable {
        let by_source: HashMap<Source, &ResolvedSource> =
            resolved.iter().map(|r| (r.source, r)).collect();

        // Sorted union keeps the persisted table deterministic.
        let genes: Vec<String> = resolved
            .iter()
            .flat_map(|r| r.scores.keys().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();

        let columns = Source::ALL
            .iter()
            .map(|&source| {
                let scores = genes
                    .iter()
                    .map(|gene| {
                        by_source
                            .get(&source)
                            .and_then(|r| r.scores.get(gene))
                            .copied()
                    })
                    .collect();
                (source, scores)
            })
            .collect();

        MergedTable { genes, columns }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![Column::new(GENE_COLUMN.into(), self.genes.clone())];
        for (source, scores) in &self.columns {
            columns.push(Column::new(source.column_name().into(), scores.clone()));
        }
        DataFrame::new(columns)
    }

    /// Write as a tab-separated table, empty string for missing values.
    pub fn write(&self, path: &str) -> PolarsResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
        }

        let mut df = self.to_dataframe()?;
        let mut file = File::create(path).map_err(|e| polars_err(Box::new(e)))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b'\t')
            .finish(&mut df)?;

        info!("merged table written to {} ({} genes)", path, self.genes.len());
        Ok(())
    }

    pub fn load(path: &str) -> PolarsResult<MergedTable> {
        let df = read_tsv(path)?;

        let genes: Vec<String> = df
            .column(GENE_COLUMN)?
            .str()?
            .into_iter()
            .map(|g| g.unwrap_or("").to_string())
            .collect();

        let mut columns = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            // An all-empty column is inferred as string; cast keeps it usable.
            let scores: Vec<Option<f64>> = df
                .column(source.column_name())?
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .collect();
            columns.push((source, scores));
        }

        Ok(MergedTable { genes, columns })
    }

    /// Gene -> score for one method, missing values skipped.
    pub fn method_scores(&self, source: Source) -> HashMap<String, f64> {
        let scores = self
            .columns
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, scores)| scores.as_slice())
            .unwrap_or(&[]);

        self.genes
            .iter()
            .zip(scores.iter())
            .filter_map(|(gene, score)| score.map(|s| (gene.clone(), s)))
            .collect()
    }

    pub fn column_values(&self, source: Source) -> &[Option<f64>] {
        self.columns
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, scores)| scores.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn resolved(source: Source, entries: &[(&str, f64)]) -> ResolvedSource {
        ResolvedSource {
            source,
            scores: entries
                .iter()
                .map(|(g, v)| (g.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            conflicts: vec![],
        }
    }

    #[test]
    fn row_set_is_the_union_of_all_sources() {
        let table = MergedTable::from_sources(&[
            resolved(Source::Rvis, &[("BRCA1", -1.2), ("TP53", -0.4)]),
            resolved(Source::Ghis, &[("EGFR", 0.6)]),
        ]);

        assert_eq!(table.genes, vec!["BRCA1", "EGFR", "TP53"]);
    }

    #[test]
    fn gene_in_one_source_has_exactly_one_cell() {
        let table = MergedTable::from_sources(&[
            resolved(Source::Rvis, &[("BRCA1", -1.2)]),
            resolved(Source::Ghis, &[("EGFR", 0.6)]),
        ]);

        let row = table.genes.iter().position(|g| g == "EGFR").unwrap();
        let filled = table
            .columns
            .iter()
            .filter(|(_, scores)| scores[row].is_some())
            .count();

        assert_eq!(filled, 1);
        assert_eq!(table.column_values(Source::Ghis)[row], Some(0.6));
    }

    #[test]
    fn absent_source_yields_an_all_empty_column() {
        let table = MergedTable::from_sources(&[resolved(Source::Rvis, &[("BRCA1", -1.2)])]);

        assert!(table
            .column_values(Source::HiPred)
            .iter()
            .all(Option::is_none));
        assert_eq!(table.columns.len(), Source::ALL.len());
    }

    #[test]
    fn method_scores_skips_missing() {
        let table = MergedTable::from_sources(&[
            resolved(Source::Rvis, &[("BRCA1", -1.2)]),
            resolved(Source::Ghis, &[("EGFR", 0.6)]),
        ]);

        let scores = table.method_scores(Source::Rvis);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["BRCA1"], -1.2);
    }
}
