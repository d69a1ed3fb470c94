use benchmark::correlation::{correlation_matrix, write_correlation_matrix};
use benchmark::merge::MergedTable;
use benchmark::models::{CORRELATION_MATRIX_PATH, MERGED_TABLE_PATH};
use polars::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> PolarsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("computing pairwise Spearman correlations");

    let table = MergedTable::load(MERGED_TABLE_PATH)?;
    let matrix = correlation_matrix(&table);
    write_correlation_matrix(&matrix, CORRELATION_MATRIX_PATH)?;

    Ok(())
}
