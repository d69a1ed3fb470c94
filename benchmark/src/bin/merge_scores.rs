use benchmark::data_handling::sources::{parse_source, source_specs};
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

    info!("merging per-source haploinsufficiency score files");

    let mut resolved = Vec::new();
    for spec in source_specs() {
        let source = parse_source(&spec)?;
        info!(
            "{}: {} genes ({} conflicting id(s) dropped)",
            source.source.column_name(),
            source.scores.len(),
            source.conflicts.len()
        );
        resolved.push(source);
    }

    let table = MergedTable::from_sources(&resolved);
    table.write(MERGED_TABLE_PATH)?;

    Ok(())
}
