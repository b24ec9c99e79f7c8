//! Synthetic binary classification problems.
//!
//! Gaussian clusters are placed on the vertices of a hypercube spanned by the
//! informative features, one or more clusters per class. Redundant features
//! are random linear combinations of the informative ones, the rest is noise.
//! A small fraction of labels is then reassigned at random.

use crate::error::DatasetError;
use crate::frame::TARGET;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;

/// Parameters of the cluster generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationParams {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_informative: usize,
    pub n_redundant: usize,
    pub n_clusters_per_class: usize,
    /// Class proportions `[class 0, class 1]`.
    pub weights: [f64; 2],
    /// Fraction of labels reassigned uniformly at random.
    pub flip_y: f64,
    /// Half the edge length of the hypercube.
    pub class_sep: f64,
    pub shuffle: bool,
}

impl ClassificationParams {
    pub fn new(n_samples: usize, n_features: usize) -> Self {
        Self {
            n_samples,
            n_features,
            n_informative: 2,
            n_redundant: 2,
            n_clusters_per_class: 2,
            weights: [0.5, 0.5],
            flip_y: 0.01,
            class_sep: 1.0,
            shuffle: true,
        }
    }

    pub fn with_weights(mut self, weights: [f64; 2]) -> Self {
        self.weights = weights;
        self
    }

    fn validate(&self) -> Result<(), DatasetError> {
        let fail = |reason: String| Err(DatasetError::invalid("synthetic", reason));

        if self.n_samples == 0 {
            return fail("n_samples must be > 0".into());
        }
        if self.n_informative == 0 || self.n_clusters_per_class == 0 {
            return fail("need at least one informative feature and one cluster per class".into());
        }
        if self.n_informative + self.n_redundant > self.n_features {
            return fail(format!(
                "informative ({}) + redundant ({}) exceed n_features ({})",
                self.n_informative, self.n_redundant, self.n_features
            ));
        }
        let clusters = 2 * self.n_clusters_per_class;
        if self.n_informative < usize::BITS as usize - 1 && clusters > 1usize << self.n_informative {
            return fail(format!(
                "{clusters} clusters do not fit on a {}-dimensional hypercube",
                self.n_informative
            ));
        }
        if self.weights.iter().any(|w| *w < 0.0) || (self.weights.iter().sum::<f64>() - 1.0).abs() > 1e-6
        {
            return fail(format!("weights {:?} must be non-negative and sum to 1", self.weights));
        }
        if !(0.0..=1.0).contains(&self.flip_y) {
            return fail(format!("flip_y {} must lie in [0, 1]", self.flip_y));
        }
        Ok(())
    }
}

/// Generate a canonical frame (`"0".."n-1"` as `Float64`, `target` as `Int32`).
pub fn make_classification<R: Rng + ?Sized>(
    params: &ClassificationParams,
    rng: &mut R,
) -> Result<DataFrame, DatasetError> {
    params.validate()?;

    let n = params.n_samples;
    let n_inf = params.n_informative;
    let n_red = params.n_redundant;
    let n_clusters = 2 * params.n_clusters_per_class;

    // Samples per cluster; the rounding remainder is dealt round-robin.
    let mut per_cluster: Vec<usize> = (0..n_clusters)
        .map(|k| (n as f64 * params.weights[k % 2] / params.n_clusters_per_class as f64) as usize)
        .collect();
    let assigned: usize = per_cluster.iter().sum();
    for i in 0..n.saturating_sub(assigned) {
        per_cluster[i % n_clusters] += 1;
    }

    let centroids = hypercube_vertices(n_clusters, n_inf, rng)
        .into_iter()
        .map(|v| {
            v.into_iter()
                .map(|bit| if bit { params.class_sep } else { -params.class_sep })
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<_>>();

    let mut x = vec![vec![0.0f64; params.n_features]; n];
    let mut y = vec![0i32; n];

    for row in x.iter_mut() {
        for value in row.iter_mut().take(n_inf) {
            *value = rng.sample(StandardNormal);
        }
    }

    // Each cluster gets its own random covariance and is shifted to its vertex.
    let mut start = 0;
    for (k, &size) in per_cluster.iter().enumerate() {
        let stop = start + size;
        let a = uniform_matrix(n_inf, n_inf, rng);
        for i in start..stop {
            y[i] = (k % 2) as i32;
            let original: Vec<f64> = x[i][..n_inf].to_vec();
            for (j, centroid) in centroids[k].iter().enumerate() {
                x[i][j] = (0..n_inf).map(|m| original[m] * a[m][j]).sum::<f64>() + centroid;
            }
        }
        start = stop;
    }

    if n_red > 0 {
        let b = uniform_matrix(n_inf, n_red, rng);
        for row in x.iter_mut() {
            for j in 0..n_red {
                let value: f64 = (0..n_inf).map(|m| row[m] * b[m][j]).sum();
                row[n_inf + j] = value;
            }
        }
    }

    for row in x.iter_mut() {
        for value in row.iter_mut().skip(n_inf + n_red) {
            *value = rng.sample(StandardNormal);
        }
    }

    for label in y.iter_mut() {
        if rng.gen::<f64>() < params.flip_y {
            *label = rng.gen_range(0..2);
        }
    }

    let mut row_order: Vec<usize> = (0..n).collect();
    let mut col_order: Vec<usize> = (0..params.n_features).collect();
    if params.shuffle {
        row_order.shuffle(rng);
        col_order.shuffle(rng);
    }

    let mut columns: Vec<Column> = col_order
        .iter()
        .enumerate()
        .map(|(out, &src)| {
            let values: Vec<f64> = row_order.iter().map(|&r| x[r][src]).collect();
            Column::new(out.to_string().into(), values)
        })
        .collect();
    let target: Vec<i32> = row_order.iter().map(|&r| y[r]).collect();
    columns.push(Column::new(TARGET.into(), target));

    Ok(DataFrame::new(columns)?)
}

/// `count` distinct vertices of the `dim`-dimensional unit hypercube.
fn hypercube_vertices<R: Rng + ?Sized>(count: usize, dim: usize, rng: &mut R) -> Vec<Vec<bool>> {
    if dim < 30 {
        return rand::seq::index::sample(rng, 1usize << dim, count)
            .into_iter()
            .map(|code| (0..dim).map(|bit| (code >> bit) & 1 == 1).collect())
            .collect();
    }

    // Too many vertices to enumerate; draw until distinct.
    let mut vertices: Vec<Vec<bool>> = Vec::with_capacity(count);
    while vertices.len() < count {
        let v: Vec<bool> = (0..dim).map(|_| rng.gen()).collect();
        if !vertices.contains(&v) {
            vertices.push(v);
        }
    }
    vertices
}

fn uniform_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{class_counts, validate_canonical};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generates_canonical_frame() {
        let params = ClassificationParams::new(400, 20).with_weights([0.97, 0.03]);
        let df = make_classification(&params, &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(df.height(), 400);
        assert_eq!(df.width(), 21);
        validate_canonical("synthetic", &df).unwrap();
    }

    #[test]
    fn weights_drive_class_balance() {
        let params = ClassificationParams::new(4000, 20).with_weights([0.97, 0.03]);
        let df = make_classification(&params, &mut StdRng::seed_from_u64(0)).unwrap();
        let counts = class_counts(&df).unwrap();

        // 120 minority samples before label noise; flips move at most ~1%.
        assert!(counts.positive > 80 && counts.positive < 180, "{counts:?}");
    }

    #[test]
    fn same_seed_same_frame() {
        let params = ClassificationParams::new(200, 8);
        let a = make_classification(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = make_classification(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        let c = make_classification(&params, &mut StdRng::seed_from_u64(4)).unwrap();
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }

    #[test]
    fn redundant_features_are_linear_in_informative_ones() {
        let mut params = ClassificationParams::new(50, 4);
        params.shuffle = false;
        params.flip_y = 0.0;
        let df = make_classification(&params, &mut StdRng::seed_from_u64(9)).unwrap();

        // With 2 informative + 2 redundant features the 4 columns have rank 2:
        // every redundant column is reproduced by a least-squares fit.
        let col = |name: &str| -> Vec<f64> {
            df.column(name).unwrap().f64().unwrap().into_no_null_iter().collect()
        };
        let (x0, x1, x2) = (col("0"), col("1"), col("2"));
        let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(p, q)| p * q).sum::<f64>();
        let (a00, a01, a11) = (dot(&x0, &x0), dot(&x0, &x1), dot(&x1, &x1));
        let (b0, b1) = (dot(&x0, &x2), dot(&x1, &x2));
        let det = a00 * a11 - a01 * a01;
        let c0 = (b0 * a11 - b1 * a01) / det;
        let c1 = (a00 * b1 - a01 * b0) / det;
        for i in 0..x2.len() {
            assert!((c0 * x0[i] + c1 * x1[i] - x2[i]).abs() < 1e-8);
        }
    }

    #[test]
    fn rejects_impossible_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(make_classification(&ClassificationParams::new(0, 20), &mut rng).is_err());
        assert!(make_classification(&ClassificationParams::new(10, 3), &mut rng).is_err());
        let bad_weights = ClassificationParams::new(10, 5).with_weights([0.5, 0.2]);
        assert!(make_classification(&bad_weights, &mut rng).is_err());
        let mut crowded = ClassificationParams::new(10, 5);
        crowded.n_clusters_per_class = 3;
        assert!(make_classification(&crowded, &mut rng).is_err());
    }
}
