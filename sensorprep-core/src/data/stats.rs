//! Column statistics: missing rates, means, correlations, value counts.

use crate::data::batch::ColumnValues;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Count of one distinct value in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Fraction of missing cells; 0.0 for an empty column.
pub fn missing_fraction(values: &ColumnValues) -> f64 {
    let total = values.len();
    if total == 0 {
        return 0.0;
    }
    values.missing_count() as f64 / total as f64
}

/// Mean over the present values, `None` when nothing is present.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Pearson correlation over pairwise-complete observations.
///
/// Undefined (`None`) with fewer than two complete pairs or when either side
/// has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Distinct present values with their counts, descending by count.
///
/// Ties are ordered by the rendered value so output is stable.
pub fn value_counts(values: &ColumnValues) -> Vec<ValueCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in 0..values.len() {
        if let Some(text) = values.render(row) {
            *counts.entry(text).or_insert(0) += 1;
        }
    }
    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}
