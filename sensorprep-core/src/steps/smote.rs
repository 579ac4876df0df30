//! SMOTE (Synthetic Minority Over-sampling Technique).

use crate::steps::oversample::OversampleError;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Output of [`Smote::fit_resample`]: original rows first, synthetic rows
/// appended class by class in ascending label order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<i64>,
    /// Synthetic rows generated per class.
    pub n_synthetic: BTreeMap<i64, usize>,
}

/// Oversamples every non-majority class up to the majority count.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize) -> Self {
        Self {
            k_neighbors,
            seed: crate::steps::SMOTE_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit_resample(&self, x: &[Vec<f64>], y: &[i64]) -> Result<Resampled, OversampleError> {
        if x.len() != y.len() {
            return Err(OversampleError::Shape(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(OversampleError::Empty);
        }
        let width = x[0].len();
        if x.iter().any(|row| row.len() != width) {
            return Err(OversampleError::Shape("feature rows differ in length".into()));
        }
        if x.iter().flatten().any(|v| !v.is_finite()) {
            return Err(OversampleError::NonFinite);
        }
        if self.k_neighbors == 0 {
            return Err(OversampleError::Neighbors {
                k: 0,
                class_size: 0,
            });
        }

        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            by_class.entry(label).or_default().push(i);
        }
        if by_class.len() < 2 {
            return Err(OversampleError::SingleClass(by_class.len()));
        }
        let majority = by_class.values().map(Vec::len).max().unwrap_or(0);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out_x = x.to_vec();
        let mut out_y = y.to_vec();
        let mut n_synthetic = BTreeMap::new();

        for (&class, rows) in &by_class {
            let needed = majority - rows.len();
            n_synthetic.insert(class, needed);
            if needed == 0 {
                continue;
            }
            if self.k_neighbors >= rows.len() {
                return Err(OversampleError::Neighbors {
                    k: self.k_neighbors,
                    class_size: rows.len(),
                });
            }

            let samples: Vec<&[f64]> = rows.iter().map(|&r| x[r].as_slice()).collect();
            let neighbors: Vec<Vec<usize>> = (0..samples.len())
                .map(|i| nearest_neighbors(&samples, i, self.k_neighbors))
                .collect();

            for _ in 0..needed {
                let i = rng.gen_range(0..samples.len());
                let nb = neighbors[i][rng.gen_range(0..neighbors[i].len())];
                let gap: f64 = rng.r#gen();
                out_x.push(interpolate(samples[i], samples[nb], gap));
                out_y.push(class);
            }
            tracing::debug!(class, generated = needed, "Generated synthetic samples");
        }

        Ok(Resampled {
            x: out_x,
            y: out_y,
            n_synthetic,
        })
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Indices of the `k` samples closest to `samples[target]`, self excluded.
/// Ties keep the lower index.
fn nearest_neighbors(samples: &[&[f64]], target: usize, k: usize) -> Vec<usize> {
    let mut dists: Vec<(f64, usize)> = samples
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target)
        .map(|(i, s)| (euclidean(samples[target], s), i))
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    dists.into_iter().take(k).map(|(_, i)| i).collect()
}

fn interpolate(point: &[f64], neighbor: &[f64], gap: f64) -> Vec<f64> {
    point
        .iter()
        .zip(neighbor)
        .map(|(&p, &n)| p + gap * (n - p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<i64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..8 {
            x.push(vec![i as f64, 0.0]);
            y.push(0);
        }
        for i in 0..3 {
            x.push(vec![10.0 + i as f64, 5.0]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_balances_to_majority() {
        let (x, y) = imbalanced();
        let out = Smote::new(2).fit_resample(&x, &y).unwrap();
        assert_eq!(out.y.iter().filter(|&&c| c == 0).count(), 8);
        assert_eq!(out.y.iter().filter(|&&c| c == 1).count(), 8);
        assert_eq!(out.n_synthetic[&1], 5);
        assert_eq!(out.n_synthetic[&0], 0);
        // Originals come first, unchanged.
        assert_eq!(&out.x[..x.len()], &x[..]);
    }

    #[test]
    fn test_synthetic_rows_lie_between_minority_samples() {
        let (x, y) = imbalanced();
        let out = Smote::new(2).fit_resample(&x, &y).unwrap();
        for row in &out.x[x.len()..] {
            assert!((10.0..=12.0).contains(&row[0]));
            assert_eq!(row[1], 5.0);
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let (x, y) = imbalanced();
        let a = Smote::new(2).fit_resample(&x, &y).unwrap();
        let b = Smote::new(2).fit_resample(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nearest_neighbors_excludes_self() {
        let pts = [vec![0.0], vec![1.0], vec![3.0], vec![10.0]];
        let refs: Vec<&[f64]> = pts.iter().map(Vec::as_slice).collect();
        assert_eq!(nearest_neighbors(&refs, 0, 2), vec![1, 2]);
        assert_eq!(nearest_neighbors(&refs, 3, 1), vec![2]);
    }

    #[test]
    fn test_errors() {
        let (x, y) = imbalanced();
        assert!(matches!(
            Smote::new(3).fit_resample(&x, &y),
            Err(OversampleError::Neighbors { k: 3, class_size: 3 })
        ));
        assert!(matches!(
            Smote::new(1).fit_resample(&x[..2], &y[..2]),
            Err(OversampleError::SingleClass(1))
        ));
        assert!(matches!(
            Smote::new(1).fit_resample(&[], &[]),
            Err(OversampleError::Empty)
        ));
        let mut bad = x.clone();
        bad[0][0] = f64::NAN;
        assert!(matches!(
            Smote::new(1).fit_resample(&bad, &y),
            Err(OversampleError::NonFinite)
        ));
    }
}
