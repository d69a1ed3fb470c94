use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::merge::MergedTable;
use crate::models::{polars_err, Source};

/// Average ranks, ties share the mean of their positions.
pub fn rank_data(vals: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = vals.iter().cloned().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; vals.len()];
    let mut i = 0;
    while i < indexed.len() {
        let val = indexed[i].1;
        let mut j = i + 1;
        while j < indexed.len() && (indexed[j].1 - val).abs() < f64::EPSILON {
            j += 1;
        }

        let avg_rank = ((i + 1) as f64 + j as f64) / 2.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }

        i = j;
    }

    ranks
}

pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut num, mut denom_x, mut denom_y) = (0.0, 0.0, 0.0);
    for (&xx, &yy) in x.iter().zip(y.iter()) {
        let dx = xx - mean_x;
        let dy = yy - mean_y;
        num += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    let denom = denom_x.sqrt() * denom_y.sqrt();
    if denom == 0.0 {
        return None;
    }

    Some(num / denom)
}

pub fn spearman_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let rx = rank_data(x);
    let ry = rank_data(y);
    pearson_correlation(&rx, &ry)
}

/// Pairwise rank correlation over the score columns, each pair computed on
/// pairwise-complete observations. Diagonal is 1.0 wherever a column has at
/// least two non-missing values; degenerate pairs stay empty.
pub fn correlation_matrix(table: &MergedTable) -> Vec<Vec<Option<f64>>> {
    let n = Source::ALL.len();
    let mut matrix = vec![vec![None; n]; n];

    for i in 0..n {
        let xs = table.column_values(Source::ALL[i]);
        let non_missing = xs.iter().flatten().count();
        matrix[i][i] = if non_missing >= 2 { Some(1.0) } else { None };

        for j in (i + 1)..n {
            let ys = table.column_values(Source::ALL[j]);

            let (mut px, mut py) = (Vec::new(), Vec::new());
            for (x, y) in xs.iter().zip(ys.iter()) {
                if let (Some(x), Some(y)) = (x, y) {
                    px.push(*x);
                    py.push(*y);
                }
            }

            let rho = spearman_correlation(&px, &py);
            matrix[i][j] = rho;
            matrix[j][i] = rho;
        }
    }

    matrix
}

/// Tab-separated symmetric matrix, 4-decimal fixed formatting, empty cell
/// where the correlation is undefined.
pub fn write_correlation_matrix(matrix: &[Vec<Option<f64>>], path: &str) -> PolarsResult<()> {
    if let Some(parent) = Path::new(path).parent() {
        create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
    }

    let mut file = File::create(path).map_err(|e| polars_err(Box::new(e)))?;

    let header: Vec<&str> = Source::ALL.iter().map(|s| s.column_name()).collect();
    writeln!(file, "\t{}", header.join("\t")).map_err(|e| polars_err(Box::new(e)))?;

    for (source, row) in Source::ALL.iter().zip(matrix.iter()) {
        let cells: Vec<String> = row
            .iter()
            .map(|rho| rho.map(|v| format!("{v:.4}")).unwrap_or_default())
            .collect();
        writeln!(file, "{}\t{}", source.column_name(), cells.join("\t"))
            .map_err(|e| polars_err(Box::new(e)))?;
    }

    info!("correlation matrix written to {}", path);
    Ok(())
}
