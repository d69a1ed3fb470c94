use std::cmp::Ordering;
use std::error::Error;
use std::fs::{create_dir_all, File};
use std::path::Path;

use plotters::prelude::*;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::models::polars_err;

/// One method's ROC curve against a label set.
#[derive(Debug, Clone)]
pub struct RocCurve {
    pub method: &'static str,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub auc: f64,
}

/// ROC points over all thresholds: scores sorted descending, one point per
/// distinct score so tied scores move diagonally instead of being credited
/// one class first.
pub fn roc_curve(truth: &[bool], scores: &[f64]) -> PolarsResult<(Vec<f64>, Vec<f64>)> {
    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;

    if positives == 0 || negatives == 0 {
        return Err(PolarsError::ComputeError(
            format!(
                "single-class evaluation set ({} positives, {} negatives)",
                positives, negatives
            )
            .into(),
        ));
    }

    let mut paired: Vec<(f64, bool)> = scores.iter().copied().zip(truth.iter().copied()).collect();
    paired.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut fpr_values = vec![0.0];
    let mut tpr_values = vec![0.0];

    let mut tp = 0;
    let mut fp = 0;
    let mut i = 0;

    while i < paired.len() {
        let threshold = paired[i].0;
        while i < paired.len() && paired[i].0 == threshold {
            if paired[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }

        tpr_values.push(tp as f64 / positives as f64);
        fpr_values.push(fp as f64 / negatives as f64);
    }

    Ok((fpr_values, tpr_values))
}

/// Area under the curve by the trapezoidal rule. Fewer than two points (or
/// mismatched inputs) leave no area to integrate: that is degenerate, not
/// zero.
pub fn auc(fpr: &[f64], tpr: &[f64]) -> Option<f64> {
    if fpr.len() != tpr.len() || fpr.len() < 2 {
        return None;
    }

    let mut auc = 0.0;
    for i in 1..fpr.len() {
        let width = fpr[i] - fpr[i - 1];
        let height = (tpr[i] + tpr[i - 1]) / 2.0;
        auc += width * height;
    }

    Some(auc)
}

pub fn roc_auc(truth: &[bool], scores: &[f64]) -> PolarsResult<f64> {
    let (fpr, tpr) = roc_curve(truth, scores)?;
    auc(&fpr, &tpr).ok_or_else(|| PolarsError::ComputeError("degenerate ROC curve".into()))
}

/// Overlay every method's curve on one chart, plus the no-discrimination
/// diagonal. Callers pass the curves in the order they should be drawn
/// (ascending AUC, so the strongest method sits last in the legend).
pub fn draw_roc_plot(output_path: &str, title: &str, curves: &[RocCurve]) -> PolarsResult<()> {
    if let Some(parent) = Path::new(output_path).parent() {
        create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
    }

    render_roc_plot(output_path, title, curves).map_err(polars_err)?;
    info!("ROC plot saved: {}", output_path);
    Ok(())
}

fn render_roc_plot(
    output_path: &str,
    title: &str,
    curves: &[RocCurve],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..1.05, 0.0..1.05)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .draw()?;

    // No-discrimination reference line.
    chart
        .draw_series(LineSeries::new(
            vec![(0.0, 0.0), (1.0, 1.0)],
            BLACK.mix(0.4).stroke_width(2),
        ))?
        .label("Random (AUC:0.50)")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.4).stroke_width(2))
        });

    let colors = [
        &RGBColor(0, 119, 182),   // Blue
        &RGBColor(217, 72, 1),    // Orange
        &RGBColor(0, 153, 136),   // Teal
        &RGBColor(153, 0, 153),   // Purple
        &RGBColor(230, 159, 0),   // Yellow
        &RGBColor(86, 180, 233),  // Sky Blue
        &RGBColor(213, 94, 0),    // Vermillion
        &RGBColor(0, 158, 115),   // Bluish Green
        &RGBColor(204, 121, 167), // Reddish Purple
    ];

    for (i, curve) in curves.iter().enumerate() {
        let color = colors[i % colors.len()];

        let points: Vec<(f64, f64)> = curve
            .fpr
            .iter()
            .zip(curve.tpr.iter())
            .map(|(&x, &y)| (x, y))
            .collect();

        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(format!("{} (AUC:{:.2})", curve.method, curve.auc))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct AucEntry<'a> {
    method: &'a str,
    auc: f64,
}

/// JSON summary of per-method AUC values, written next to the plot.
pub fn save_auc_summary(path: &str, curves: &[RocCurve]) -> PolarsResult<()> {
    let entries: Vec<AucEntry> = curves
        .iter()
        .map(|c| AucEntry {
            method: c.method,
            auc: c.auc,
        })
        .collect();

    let file = File::create(path).map_err(|e| polars_err(Box::new(e)))?;
    serde_json::to_writer_pretty(file, &entries).map_err(|e| polars_err(Box::new(e)))?;

    info!("AUC summary saved: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_separation_has_unit_auc() {
        let truth = [true, true, false, false];
        let scores = [0.9, 0.6, 0.4, 0.1];
        assert!((roc_auc(&truth, &scores).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tied_scores_average_to_half() {
        let truth = [true, false];
        let scores = [0.5, 0.5];
        assert!((roc_auc(&truth, &scores).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverted_ranking_has_zero_auc() {
        let truth = [false, false, true, true];
        let scores = [0.9, 0.6, 0.4, 0.1];
        assert!(roc_auc(&truth, &scores).unwrap().abs() < 1e-12);
    }

    #[test]
    fn too_few_points_have_no_area() {
        assert_eq!(auc(&[], &[]), None);
        assert_eq!(auc(&[0.0], &[0.0]), None);
        assert_eq!(auc(&[0.0, 1.0], &[0.0]), None);
    }

    #[test]
    fn single_class_set_is_an_error() {
        let truth = [true, true];
        let scores = [0.9, 0.1];
        assert!(roc_curve(&truth, &scores).is_err());
    }

    #[test]
    fn curve_starts_at_origin_and_ends_at_one_one() {
        let truth = [true, false, true, false, true];
        let scores = [0.8, 0.7, 0.6, 0.3, 0.2];
        let (fpr, tpr) = roc_curve(&truth, &scores).unwrap();

        assert_eq!((fpr[0], tpr[0]), (0.0, 0.0));
        assert_eq!(
            (*fpr.last().unwrap(), *tpr.last().unwrap()),
            (1.0, 1.0)
        );
    }

    #[test]
    fn negation_preserves_auc_of_inverted_scales() {
        // Rank order under negation + 0.0 cutoff equals the direct ranking.
        let truth = [true, true, false];
        let raw = [-0.9, -0.6, -0.1]; // inverted scale: lower = more intolerant
        let negated: Vec<f64> = raw.iter().map(|s| -s).collect();
        let direct = [0.9, 0.6, 0.1];

        let a = roc_auc(&truth, &negated).unwrap();
        let b = roc_auc(&truth, &direct).unwrap();
        assert!((a - b).abs() < 1e-12);
    }
}
