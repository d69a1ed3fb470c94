use std::fmt::Write as _;

/// 2x2 confusion matrix over binarized predictions. Truth is the label set
/// (+1 -> positive, -1 -> negative); predictions come from thresholding the
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Binarize `scores` at `cutoff` (>= is positive) against the truth.
    pub fn from_scores(truth: &[bool], scores: &[f64], cutoff: f64) -> ConfusionMatrix {
        let mut cm = ConfusionMatrix {
            tp: 0,
            fp: 0,
            tn: 0,
            fn_: 0,
        };

        for (&actual, &score) in truth.iter().zip(scores.iter()) {
            let predicted = score >= cutoff;
            match (actual, predicted) {
                (true, true) => cm.tp += 1,
                (true, false) => cm.fn_ += 1,
                (false, true) => cm.fp += 1,
                (false, false) => cm.tn += 1,
            }
        }

        cm
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    // A zero denominator leaves the rate undefined (None); it is reported as
    // such rather than coerced to 0 or allowed to produce NaN.

    pub fn accuracy(&self) -> Option<f64> {
        rate(self.tp + self.tn, self.total())
    }

    pub fn sensitivity(&self) -> Option<f64> {
        rate(self.tp, self.tp + self.fn_)
    }

    pub fn specificity(&self) -> Option<f64> {
        rate(self.tn, self.tn + self.fp)
    }

    pub fn ppv(&self) -> Option<f64> {
        rate(self.tp, self.tp + self.fp)
    }

    pub fn npv(&self) -> Option<f64> {
        rate(self.tn, self.tn + self.fn_)
    }

    /// Crosstab rendering with margins, truth on rows, predictions on
    /// columns.
    pub fn format_with_margins(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Predicted      0      1    All");
        let _ = writeln!(out, "Truth");
        let _ = writeln!(
            out,
            "0         {:>6} {:>6} {:>6}",
            self.tn,
            self.fp,
            self.tn + self.fp
        );
        let _ = writeln!(
            out,
            "1         {:>6} {:>6} {:>6}",
            self.fn_,
            self.tp,
            self.fn_ + self.tp
        );
        let _ = write!(
            out,
            "All       {:>6} {:>6} {:>6}",
            self.tn + self.fn_,
            self.fp + self.tp,
            self.total()
        );
        out
    }
}

fn rate(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}
