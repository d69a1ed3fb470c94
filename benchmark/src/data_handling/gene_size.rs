use std::collections::BTreeMap;

use polars::prelude::*;

use crate::models::polars_err;

pub const GENE_SIZE_PATH: &str = "./data/Annotations/meta.txt";

/// Gene id -> genomic span, used only for nearest-size negative matching.
/// BTreeMap so the matching pool iterates in a defined order.
pub type GeneSizeIndex = BTreeMap<String, u64>;

/// Comma-separated annotation metadata, header skipped; size is
/// |end - start| from the two positional columns.
pub fn load_gene_sizes(path: &str) -> PolarsResult<GeneSizeIndex> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| polars_err(Box::new(e)))?;

    let mut sizes = GeneSizeIndex::new();

    for record in reader.records() {
        let record = record.map_err(|e| polars_err(Box::new(e)))?;
        let gene = record.get(0).unwrap_or("").trim();
        if gene.is_empty() {
            continue;
        }

        let start = parse_coordinate(path, gene, record.get(3))?;
        let end = parse_coordinate(path, gene, record.get(4))?;

        sizes.insert(gene.to_string(), start.abs_diff(end));
    }

    Ok(sizes)
}

fn parse_coordinate(path: &str, gene: &str, field: Option<&str>) -> PolarsResult<i64> {
    field
        .and_then(|f| f.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            PolarsError::ComputeError(
                format!("{}: bad coordinate for gene {}", path, gene).into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn size_is_absolute_span() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"gene,chr,strand,start,end\nBRCA1,17,-,43125482,43044294\nTP53,17,-,7668420,7687550\n")
            .unwrap();

        let sizes = load_gene_sizes(file.path().to_str().unwrap()).unwrap();
        assert_eq!(sizes["BRCA1"], 43125482 - 43044294);
        assert_eq!(sizes["TP53"], 7687550 - 7668420);
    }

    #[test]
    fn bad_coordinate_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"gene,chr,strand,start,end\nBRCA1,17,-,oops,43044294\n")
            .unwrap();

        assert!(load_gene_sizes(file.path().to_str().unwrap()).is_err());
    }
}
