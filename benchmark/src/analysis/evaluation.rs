use std::collections::{BTreeMap, BTreeSet, HashMap};

use polars::prelude::*;
use tracing::{info, warn};

use crate::analysis::matching::match_negatives;
use crate::analysis::metrics::ConfusionMatrix;
use crate::analysis::roc::{auc, draw_roc_plot, roc_curve, save_auc_summary, RocCurve};
use crate::data_handling::gene_size::GeneSizeIndex;
use crate::data_handling::labels::{load_gene_list, TrainingLabels};
use crate::data_handling::validation::{cohorts, flagged_genes, CohortSource};
use crate::merge::MergedTable;
use crate::models::{Source, OUTPUT_DIR};

/// Restrict a method's scores to the labeled genes with a non-missing score.
/// Label iteration order is the BTreeMap order, so the pairs are stable.
fn evaluation_pairs(
    scores: &HashMap<String, f64>,
    labels: &BTreeMap<String, i32>,
) -> (Vec<bool>, Vec<f64>) {
    let mut truth = Vec::new();
    let mut values = Vec::new();

    for (gene, &label) in labels {
        if let Some(&score) = scores.get(gene) {
            truth.push(label > 0);
            values.push(score);
        }
    }

    (truth, values)
}

fn method_curve(
    table: &MergedTable,
    source: Source,
    labels: &BTreeMap<String, i32>,
    context: &str,
) -> PolarsResult<(RocCurve, ConfusionMatrix)> {
    let scores_by_gene = table.method_scores(source);
    let (truth, mut scores) = evaluation_pairs(&scores_by_gene, labels);

    if truth.is_empty() {
        return Err(PolarsError::ComputeError(
            format!(
                "{}: no usable (labeled, non-missing) scores for {}",
                context,
                source.column_name()
            )
            .into(),
        ));
    }

    if source.inverted_scale() {
        for score in &mut scores {
            *score = -*score;
        }
    }

    let (fpr, tpr) = roc_curve(&truth, &scores)?;
    let area = auc(&fpr, &tpr).ok_or_else(|| {
        PolarsError::ComputeError(
            format!("{}: degenerate ROC curve for {}", context, source.column_name()).into(),
        )
    })?;
    let cm = ConfusionMatrix::from_scores(&truth, &scores, source.cutoff());

    Ok((
        RocCurve {
            method: source.column_name(),
            fpr,
            tpr,
            auc: area,
        },
        cm,
    ))
}

fn fmt_rate(method: &str, name: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => {
            warn!("{}: {} undefined (zero denominator)", method, name);
            "undef".to_string()
        }
    }
}

/// Phase A: self-evaluation of every method against the training label set.
/// HIPred is skipped here; its cross-validated performance is reported
/// elsewhere.
pub fn run_training_evaluation(
    table: &MergedTable,
    training: &TrainingLabels,
) -> PolarsResult<()> {
    println!();
    println!("performance on training data");
    println!();
    println!("  # Pos (raw): {}", training.raw_positive);
    println!("  # Neg (raw): {}", training.raw_negative);

    println!(
        "found {} inconsistent record(s) ...",
        training.inconsistent.len()
    );
    for gene in &training.inconsistent {
        println!("  {}", gene);
    }

    println!();
    println!("  # Pos (processed): {}", training.positive_count());
    println!("  # Neg (processed): {}", training.negative_count());
    println!();

    for source in Source::ALL {
        if source == Source::HiPred {
            continue;
        }

        let (curve, cm) = method_curve(table, source, &training.labels, "training")?;
        let method = source.column_name();

        println!("{}", cm.format_with_margins());
        println!();
        println!("{}", method);
        println!("   n             : {}", cm.total());
        println!();
        println!("  tp             : {}", cm.tp);
        println!("  fp             : {}", cm.fp);
        println!("  tn             : {}", cm.tn);
        println!("  fn             : {}", cm.fn_);
        println!();
        println!(
            "  Accuracy       : {}",
            fmt_rate(method, "Accuracy", cm.accuracy())
        );
        println!(
            "  Sensitivity    : {}",
            fmt_rate(method, "Sensitivity", cm.sensitivity())
        );
        println!(
            "  Specificity    : {}",
            fmt_rate(method, "Specificity", cm.specificity())
        );
        println!(
            "  Precision (PPV): {}",
            fmt_rate(method, "PPV", cm.ppv())
        );
        println!("  NPV            : {}", fmt_rate(method, "NPV", cm.npv()));
        println!("  AUC            : {:.4}", curve.auc);
        println!();
    }

    Ok(())
}

/// Build one validation cohort's label set: the cohort's genes (minus any
/// training gene) as positives, nearest-size matched controls as negatives,
/// ambiguous overlap removed from the negative side.
fn cohort_labels(
    positive: Vec<String>,
    sizes: &GeneSizeIndex,
) -> BTreeMap<String, i32> {
    let negative = match_negatives(&positive, sizes);

    let positive_set: BTreeSet<String> = positive.into_iter().collect();
    let negative_set: BTreeSet<String> = negative
        .into_iter()
        .filter(|gene| !positive_set.contains(gene))
        .collect();

    let mut labels: BTreeMap<String, i32> = BTreeMap::new();
    for gene in negative_set {
        labels.insert(gene, -1);
    }
    for gene in positive_set {
        labels.insert(gene, 1);
    }

    labels
}

/// Phase B: evaluate every method against each independent validation
/// cohort, print the per-cohort report table, and write one ROC plot and AUC
/// summary per cohort.
pub fn run_validation_evaluation(
    table: &MergedTable,
    training: &TrainingLabels,
    sizes: &GeneSizeIndex,
    validation_table: &DataFrame,
) -> PolarsResult<()> {
    println!();
    println!("performance on validation data");
    println!();

    for cohort in cohorts() {
        let mut positive = match &cohort.source {
            CohortSource::FlagColumn(column) => flagged_genes(validation_table, column)?,
            CohortSource::GeneList(path) => load_gene_list(path)?,
        };

        // Leakage guard: drop anything the training phase already used.
        positive.retain(|gene| !training.labels.contains_key(gene));

        let labels = cohort_labels(positive, sizes);

        println!("{}", cohort.name);
        for (gene, label) in &labels {
            println!("{},{}", gene, label);
        }
        println!();
        println!();

        let positives = labels.values().filter(|&&l| l == 1).count();
        let negatives = labels.values().filter(|&&l| l == -1).count();

        println!();
        println!("# dataset : {}", cohort.short_name);
        println!("# Pos: {}", positives);
        println!("# Neg: {}", negatives);
        println!();

        let mut curves = Vec::with_capacity(Source::ALL.len());

        for source in Source::ALL {
            let (curve, cm) = method_curve(table, source, &labels, cohort.short_name)?;
            let method = source.column_name();

            println!(
                "     {} & {} & {} & {} & {} & {} & {:.4}",
                method,
                fmt_rate(method, "Accuracy", cm.accuracy()),
                fmt_rate(method, "Sensitivity", cm.sensitivity()),
                fmt_rate(method, "Specificity", cm.specificity()),
                fmt_rate(method, "PPV", cm.ppv()),
                fmt_rate(method, "NPV", cm.npv()),
                curve.auc
            );

            curves.push(curve);
        }

        // Weakest curve first so the strongest ends up on top of the plot.
        curves.sort_by(|a, b| a.auc.partial_cmp(&b.auc).unwrap_or(std::cmp::Ordering::Equal));

        let plot_path = format!("{}/{}.png", OUTPUT_DIR, cohort.short_name);
        draw_roc_plot(&plot_path, cohort.short_name, &curves)?;

        let summary_path = format!("{}/{}_auc.json", OUTPUT_DIR, cohort.short_name);
        save_auc_summary(&summary_path, &curves)?;

        info!(
            "{}: {} positives, {} negatives, plot at {}",
            cohort.short_name, positives, negatives, plot_path
        );
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::sources::ResolvedSource;

    fn table_with(source: Source, entries: &[(&str, f64)]) -> MergedTable {
        MergedTable::from_sources(&[ResolvedSource {
            source,
            scores: entries
                .iter()
                .map(|(g, v)| (g.to_string(), *v))
                .collect(),
            conflicts: vec![],
        }])
    }

    #[test]
    fn pairs_skip_missing_scores() {
        let table = table_with(Source::Ghis, &[("A", 0.9), ("B", 0.1)]);
        let labels: BTreeMap<String, i32> = [
            ("A".to_string(), 1),
            ("B".to_string(), -1),
            ("C".to_string(), 1), // no GHIS score
        ]
        .into_iter()
        .collect();

        let scores = table.method_scores(Source::Ghis);
        let (truth, values) = evaluation_pairs(&scores, &labels);

        assert_eq!(truth, vec![true, false]);
        assert_eq!(values, vec![0.9, 0.1]);
    }

    #[test]
    fn zero_usable_pairs_is_fatal() {
        let table = table_with(Source::Ghis, &[("A", 0.9)]);
        let labels: BTreeMap<String, i32> =
            [("X".to_string(), 1), ("Y".to_string(), -1)].into_iter().collect();

        assert!(method_curve(&table, Source::Ghis, &labels, "test").is_err());
    }

    #[test]
    fn inverted_scale_is_negated_before_thresholding() {
        // RVIS: intolerant genes score low, so raw -0.3 (intolerant) must be
        // classified positive under the 0.0 cutoff after negation.
        let table = table_with(Source::Rvis, &[("A", -0.3), ("B", 0.2)]);
        let labels: BTreeMap<String, i32> =
            [("A".to_string(), 1), ("B".to_string(), -1)].into_iter().collect();

        let (curve, cm) = method_curve(&table, Source::Rvis, &labels, "test").unwrap();
        assert_eq!(cm.tp, 1);
        assert_eq!(cm.tn, 1);
        assert!((curve.auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ambiguous_genes_are_dropped_from_the_negative_side() {
        // CTRL is both a positive and the only possible matched control; the
        // positive label must win and no -1 label may survive.
        let sizes: GeneSizeIndex = [
            ("POS".to_string(), 100u64),
            ("CTRL".to_string(), 105u64),
        ]
        .into_iter()
        .collect();

        let labels = cohort_labels(vec!["POS".to_string(), "CTRL".to_string()], &sizes);

        // CTRL is a positive here, so it can never be labeled -1.
        assert_eq!(labels.get("CTRL"), Some(&1));
        assert_eq!(labels.get("POS"), Some(&1));
        assert!(!labels.values().any(|&l| l == -1));
    }
}
