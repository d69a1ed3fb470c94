use std::error::Error;

use polars::prelude::PolarsError;

/// Merged score table produced by the merge stage and consumed by the
/// correlation and benchmark stages.
pub const MERGED_TABLE_PATH: &str = "./tmp/prediction_matrix.tsv";
pub const CORRELATION_MATRIX_PATH: &str = "./tmp/correlation_matrix.tsv";

/// Plots and JSON summaries land next to the intermediate tables.
pub const OUTPUT_DIR: &str = "./tmp";

/// The seven published haploinsufficiency scores, in merged-table column
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Rvis,
    Is,
    EvoTol,
    His,
    HisImputed,
    Ghis,
    HiPred,
}

impl Source {
    pub const ALL: [Source; 7] = [
        Source::Rvis,
        Source::Is,
        Source::EvoTol,
        Source::His,
        Source::HisImputed,
        Source::Ghis,
        Source::HiPred,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Source::Rvis => "RVIS",
            Source::Is => "IS",
            Source::EvoTol => "EvoTol",
            Source::His => "HIS",
            Source::HisImputed => "HIS - Imputed",
            Source::Ghis => "GHIS",
            Source::HiPred => "HIPred",
        }
    }

    /// RVIS and EvoTol rank intolerant genes low, the opposite of every
    /// other score. Their values are negated before thresholding.
    pub fn inverted_scale(self) -> bool {
        matches!(self, Source::Rvis | Source::EvoTol)
    }

    /// Classification cutoff applied after any negation.
    pub fn cutoff(self) -> f64 {
        if self.inverted_scale() {
            0.0
        } else {
            0.5
        }
    }
}

pub fn polars_err(e: Box<dyn Error>) -> PolarsError {
    PolarsError::ComputeError(format!("{e}").into())
}
