use polars::prelude::*;
use tracing::info;

use crate::helper_functions::read_tsv;

pub const VALIDATION_TABLE_PATH: &str = "./data/Petrovski_DatasetS1.csv";
pub const ASD1_PATH: &str = "./data/ASD1.txt";
pub const ASD2_PATH: &str = "./data/ASD2.txt";

/// Where a validation cohort's positive genes come from: a flag column of
/// the benchmark table, or a standalone gene list.
#[derive(Debug, Clone)]
pub enum CohortSource {
    FlagColumn(&'static str),
    GeneList(&'static str),
}

#[derive(Debug, Clone)]
pub struct Cohort {
    pub name: &'static str,
    /// Short name used in the report and the plot file name.
    pub short_name: &'static str,
    pub source: CohortSource,
}

/// The six validation cohorts. The misspelling in the second flag column is
/// the benchmark table's own.
pub fn cohorts() -> Vec<Cohort> {
    vec![
        Cohort {
            name: "OMIM Haploinsufficiency",
            short_name: "OMIM HI",
            source: CohortSource::FlagColumn("OMIM Haploinsufficiency"),
        },
        Cohort {
            name: "OMIM de novo & Haploinsuficciency",
            short_name: "OMIM HI de novo",
            source: CohortSource::FlagColumn("OMIM de novo & Haploinsuficciency"),
        },
        Cohort {
            name: "MGI Lethality orthologs",
            short_name: "MGI Lethality",
            source: CohortSource::FlagColumn("MGI Lethality orthologs"),
        },
        Cohort {
            name: "MGI Seizure orthologs",
            short_name: "MGI Seizure",
            source: CohortSource::FlagColumn("MGI Seizure orthologs"),
        },
        Cohort {
            name: "ASD1",
            short_name: "ASD1",
            source: CohortSource::GeneList(ASD1_PATH),
        },
        Cohort {
            name: "ASD2",
            short_name: "ASD2",
            source: CohortSource::GeneList(ASD2_PATH),
        },
    ]
}

/// The validation benchmark table: tab-separated despite the extension,
/// gene ids in the first column, one flag column per cohort.
pub fn load_validation_table(path: &str) -> PolarsResult<DataFrame> {
    info!("reading validation benchmark table from {}", path);
    let df = read_tsv(path)?;
    if df.width() == 0 {
        return Err(PolarsError::ComputeError(
            format!("{}: empty validation table", path).into(),
        ));
    }
    Ok(df)
}

/// Genes whose flag column is set (> 0). Missing flags count as unset.
pub fn flagged_genes(df: &DataFrame, flag_column: &str) -> PolarsResult<Vec<String>> {
    let gene_column = df.get_column_names()[0].clone();

    let flagged = df
        .clone()
        .lazy()
        .filter(col(flag_column).cast(DataType::Float64).gt(lit(0.0)))
        .select([col(gene_column.as_str())])
        .collect()?;

    Ok(flagged
        .column(gene_column.as_str())?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagged_genes_respects_threshold_and_nulls() {
        let df = df![
            "GENE" => ["BRCA1", "TP53", "EGFR", "OR2T1"],
            "OMIM Haploinsufficiency" => [Some(1.0), Some(0.0), None, Some(2.0)],
        ]
        .unwrap();

        let genes = flagged_genes(&df, "OMIM Haploinsufficiency").unwrap();
        assert_eq!(genes, vec!["BRCA1".to_string(), "OR2T1".to_string()]);
    }
}
