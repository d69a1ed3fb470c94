use benchmark::analysis::evaluation::{run_training_evaluation, run_validation_evaluation};
use benchmark::data_handling::gene_size::{load_gene_sizes, GENE_SIZE_PATH};
use benchmark::data_handling::labels::{
    load_training_labels, TRAINING_NEGATIVE_PATH, TRAINING_POSITIVE_PATH,
};
use benchmark::data_handling::validation::{load_validation_table, VALIDATION_TABLE_PATH};
use benchmark::merge::MergedTable;
use benchmark::models::MERGED_TABLE_PATH;
use polars::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> PolarsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("benchmarking merged scores");

    let table = MergedTable::load(MERGED_TABLE_PATH)?;

    let training = load_training_labels(TRAINING_POSITIVE_PATH, TRAINING_NEGATIVE_PATH)?;
    run_training_evaluation(&table, &training)?;

    let sizes = load_gene_sizes(GENE_SIZE_PATH)?;
    let validation_table = load_validation_table(VALIDATION_TABLE_PATH)?;
    run_validation_evaluation(&table, &training, &sizes, &validation_table)?;

    Ok(())
}
