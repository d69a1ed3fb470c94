use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};

use polars::prelude::*;
use tracing::warn;

use crate::models::{polars_err, Source};

/// How to pull a field out of a delimited record.
#[derive(Debug, Clone, Copy)]
pub enum FieldSelector {
    Column(usize),
    LastColumn,
    /// Field packed as `gene|score|pvalue`; take one part of it.
    PipePart { column: usize, part: usize },
}

/// Stop reading once this column no longer matches. The EvoTol export is
/// sorted by rank percentile and only the leading percentile-1 block is
/// usable.
#[derive(Debug, Clone)]
pub struct EarlyStop {
    pub column: usize,
    pub equals: String,
}

/// Declarative layout of one upstream score file.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub source: Source,
    pub path: String,
    pub delimiter: char,
    pub skip_header: bool,
    pub key: FieldSelector,
    pub value: FieldSelector,
    pub stop_unless: Option<EarlyStop>,
}

/// The seven upstream datasets with their native column layouts.
pub fn source_specs() -> Vec<SourceSpec> {
    vec![
        SourceSpec {
            source: Source::Rvis,
            path: "./data/Petrovski.txt".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::Column(0),
            value: FieldSelector::Column(1),
            stop_unless: None,
        },
        SourceSpec {
            source: Source::Is,
            path: "./data/Khurana.txt".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::Column(0),
            value: FieldSelector::LastColumn,
            stop_unless: None,
        },
        SourceSpec {
            source: Source::EvoTol,
            path: "./data/Rackham.txt".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::Column(2),
            value: FieldSelector::Column(3),
            stop_unless: Some(EarlyStop {
                column: 1,
                equals: "1".to_string(),
            }),
        },
        SourceSpec {
            source: Source::His,
            path: "./data/Huang_NoImp.txt".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::PipePart { column: 3, part: 0 },
            value: FieldSelector::PipePart { column: 3, part: 1 },
            stop_unless: None,
        },
        SourceSpec {
            source: Source::HisImputed,
            path: "./data/Huang_Imp.txt".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::PipePart { column: 3, part: 0 },
            value: FieldSelector::PipePart { column: 3, part: 1 },
            stop_unless: None,
        },
        SourceSpec {
            source: Source::Ghis,
            path: "./data/Steinberg.txt".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::Column(1),
            value: FieldSelector::Column(2),
            stop_unless: None,
        },
        SourceSpec {
            source: Source::HiPred,
            path: "./data/HIPred.tsv".to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::Column(0),
            value: FieldSelector::Column(1),
            stop_unless: None,
        },
    ]
}

/// One upstream dataset after conflict resolution: at most one score per
/// gene, conflicting duplicates dropped entirely.
#[derive(Debug)]
pub struct ResolvedSource {
    pub source: Source,
    pub scores: BTreeMap<String, f64>,
    pub conflicts: Vec<String>,
}

fn select_field<'a>(
    fields: &[&'a str],
    selector: FieldSelector,
    spec: &SourceSpec,
) -> PolarsResult<&'a str> {
    let field = match selector {
        FieldSelector::Column(i) => fields.get(i).copied(),
        FieldSelector::LastColumn => fields.last().copied(),
        FieldSelector::PipePart { column, part } => fields
            .get(column)
            .and_then(|packed| packed.split('|').nth(part)),
    };

    field.ok_or_else(|| {
        PolarsError::ComputeError(
            format!("{}: record too short for {:?}", spec.path, selector).into(),
        )
    })
}

/// Parse one upstream score file into a clean gene -> score map.
///
/// A gene id recurring with a different score marks the gene as conflicted
/// and removes it from this source entirely; identical duplicates are kept
/// once. Malformed floats are fatal.
pub fn parse_source(spec: &SourceSpec) -> PolarsResult<ResolvedSource> {
    let file = File::open(&spec.path).map_err(|e| {
        PolarsError::ComputeError(format!("failed to open {}: {}", spec.path, e).into())
    })?;
    let reader = BufReader::new(file);

    let mut scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut conflicted: BTreeSet<String> = BTreeSet::new();

    let mut lines = reader.lines();
    if spec.skip_header {
        if let Some(header) = lines.next() {
            header.map_err(|e| polars_err(Box::new(e)))?;
        }
    }

    for line in lines {
        let line = line.map_err(|e| polars_err(Box::new(e)))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(spec.delimiter).collect();

        if let Some(stop) = &spec.stop_unless {
            if select_field(&fields, FieldSelector::Column(stop.column), spec)? != stop.equals {
                break;
            }
        }

        let gene = select_field(&fields, spec.key, spec)?.to_string();
        let raw = select_field(&fields, spec.value, spec)?;
        let value: f64 = raw.parse().map_err(|_| {
            PolarsError::ComputeError(
                format!("{}: unparseable score '{}' for gene {}", spec.path, raw, gene).into(),
            )
        })?;

        match scores.get(&gene).copied() {
            Some(previous) if previous != value => {
                conflicted.insert(gene);
            }
            _ => {
                scores.insert(gene, value);
            }
        }
    }

    for gene in &conflicted {
        scores.remove(gene);
    }

    if !conflicted.is_empty() {
        warn!(
            "{}: dropped {} gene id(s) with conflicting duplicate scores",
            spec.path,
            conflicted.len()
        );
    }

    Ok(ResolvedSource {
        source: spec.source,
        scores,
        conflicts: conflicted.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn spec_for(path: &str) -> SourceSpec {
        SourceSpec {
            source: Source::Rvis,
            path: path.to_string(),
            delimiter: '\t',
            skip_header: true,
            key: FieldSelector::Column(0),
            value: FieldSelector::Column(1),
            stop_unless: None,
        }
    }

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn identical_duplicate_is_kept_once() {
        let file = write_fixture("gene\tscore\nBRCA1\t0.7\nBRCA1\t0.7\nTP53\t0.2\n");
        let resolved = parse_source(&spec_for(file.path().to_str().unwrap())).unwrap();

        assert_eq!(resolved.scores.len(), 2);
        assert_eq!(resolved.scores["BRCA1"], 0.7);
        assert!(resolved.conflicts.is_empty());
    }

    #[test]
    fn conflicting_duplicate_drops_the_gene() {
        let file = write_fixture("gene\tscore\nBRCA1\t0.7\nBRCA1\t0.9\nTP53\t0.2\n");
        let resolved = parse_source(&spec_for(file.path().to_str().unwrap())).unwrap();

        assert!(!resolved.scores.contains_key("BRCA1"));
        assert_eq!(resolved.scores["TP53"], 0.2);
        assert_eq!(resolved.conflicts, vec!["BRCA1".to_string()]);
    }

    #[test]
    fn malformed_float_is_fatal() {
        let file = write_fixture("gene\tscore\nBRCA1\tnot-a-number\n");
        assert!(parse_source(&spec_for(file.path().to_str().unwrap())).is_err());
    }

    #[test]
    fn pipe_packed_fields_are_unpacked() {
        let file = write_fixture("a\tb\tc\tpacked\nx\ty\tz\tBRCA1|0.83|0.001\n");
        let mut spec = spec_for(file.path().to_str().unwrap());
        spec.key = FieldSelector::PipePart { column: 3, part: 0 };
        spec.value = FieldSelector::PipePart { column: 3, part: 1 };

        let resolved = parse_source(&spec).unwrap();
        assert_eq!(resolved.scores["BRCA1"], 0.83);
    }

    #[test]
    fn early_stop_ends_the_scan() {
        let file = write_fixture(
            "id\tpct\tgene\tscore\nr1\t1\tBRCA1\t0.7\nr2\t1\tTP53\t0.4\nr3\t2\tEGFR\t0.9\n",
        );
        let mut spec = spec_for(file.path().to_str().unwrap());
        spec.key = FieldSelector::Column(2);
        spec.value = FieldSelector::Column(3);
        spec.stop_unless = Some(EarlyStop {
            column: 1,
            equals: "1".to_string(),
        });

        let resolved = parse_source(&spec).unwrap();
        assert_eq!(resolved.scores.len(), 2);
        assert!(!resolved.scores.contains_key("EGFR"));
    }
}
