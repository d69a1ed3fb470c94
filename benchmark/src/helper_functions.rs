use std::path::PathBuf;

use polars::prelude::*;

pub fn read_tsv(file_path: &str) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))?
        .finish()
}
