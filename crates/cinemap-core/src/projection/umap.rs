//! Native UMAP.
//!
//! Fit: exact k-nearest-neighbor graph, per-point bandwidth calibration,
//! fuzzy-union symmetrization, then an epoch-scheduled SGD layout with
//! negative sampling starting from a PCA initialization.
//!
//! Transform: the same membership weights are computed between the new
//! vector and its training neighbors; the point starts at the weighted
//! mean of those neighbors' coordinates and is optimized against the
//! frozen training layout.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{
    DimensionReducer, FittedProjection, Metric, Point2, ProjectionConfig, ProjectionError, Result,
};

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const BANDWIDTH_ITERATIONS: usize = 64;
const MIN_K_DIST_SCALE: f64 = 1e-3;
const GRAD_CLIP: f64 = 4.0;
/// Initial layouts are scaled so the largest coordinate has this magnitude.
const INIT_EXTENT: f64 = 10.0;
const INIT_NOISE: f64 = 1e-4;
const POWER_ITERATIONS: usize = 64;
const CURVE_SAMPLES: usize = 300;

/// UMAP reducer holding validated hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct UmapReducer {
    config: ProjectionConfig,
}

impl UmapReducer {
    pub fn new(config: ProjectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }
}

/// A fitted UMAP layout.
///
/// Keeps the training matrix so unseen vectors can find their neighbors.
#[derive(Debug, Clone)]
pub struct UmapModel {
    config: ProjectionConfig,
    data: Array2<f64>,
    norms: Array1<f64>,
    embedding: Vec<Point2>,
    /// Effective neighbor count, `min(n_neighbors, n - 1)`.
    k: usize,
    /// Mean neighbor distance over the training graph.
    mean_distance: f64,
    a: f64,
    b: f64,
}

impl UmapModel {
    /// Fitted low-dimensional kernel parameters `(a, b)`.
    pub fn curve_params(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// Input dimension, 0 for an empty model.
    pub fn dimension(&self) -> usize {
        self.data.ncols()
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    head: usize,
    tail: usize,
    weight: f64,
}

/// SGD parameters shared by fit and transform.
struct Schedule {
    a: f64,
    b: f64,
    gamma: f64,
    initial_alpha: f64,
    n_epochs: usize,
    negative_sample_rate: usize,
    /// Whether attraction also moves the tail point.
    move_other: bool,
    /// Negative samples are drawn from `0..negative_pool`.
    negative_pool: usize,
}

impl DimensionReducer for UmapReducer {
    type Model = UmapModel;

    fn fit(&self, data: &[Vec<f64>]) -> Result<UmapModel> {
        let config = &self.config;
        let (a, b) = find_ab_params(config.spread, config.min_dist);
        let n = data.len();

        if n == 0 {
            return Ok(UmapModel {
                config: config.clone(),
                data: Array2::zeros((0, 0)),
                norms: Array1::zeros(0),
                embedding: Vec::new(),
                k: 0,
                mean_distance: 0.0,
                a,
                b,
            });
        }

        let matrix = to_matrix(data)?;
        let norms = row_norms(&matrix);

        if n == 1 {
            return Ok(UmapModel {
                config: config.clone(),
                data: matrix,
                norms,
                embedding: vec![[0.0, 0.0]],
                k: 0,
                mean_distance: 0.0,
                a,
                b,
            });
        }

        let k = config.n_neighbors.min(n - 1);
        let graph = knn_graph(&matrix, &norms, k, config.metric);
        let total: f64 = graph.iter().flatten().map(|&(_, d)| d).sum();
        let mean_distance = total / (n * k) as f64;

        let mut directed = BTreeMap::new();
        for (i, neighbors) in graph.iter().enumerate() {
            let distances: Vec<f64> = neighbors.iter().map(|&(_, d)| d).collect();
            let (sigma, rho) = smooth_knn_dist(&distances, mean_distance);
            for &(j, d) in neighbors {
                directed.insert((i, j), membership(d, rho, sigma));
            }
        }
        let edges = fuzzy_union(&directed);

        let mut rng = StdRng::seed_from_u64(config.random_state);
        let mut coords = pca_init(&matrix, &norms, config.metric, &mut rng)
            .unwrap_or_else(|| random_init(n, &mut rng));

        let schedule = Schedule {
            a,
            b,
            gamma: config.repulsion_strength,
            initial_alpha: config.learning_rate,
            n_epochs: config.n_epochs,
            negative_sample_rate: config.negative_sample_rate,
            move_other: true,
            negative_pool: n,
        };
        optimize_layout(&mut coords, &edges, &schedule, &mut rng);

        debug!(
            "umap fit: {} points, {} edges, k={}, a={:.4}, b={:.4}",
            n,
            edges.len(),
            k,
            a,
            b
        );

        Ok(UmapModel {
            config: config.clone(),
            data: matrix,
            norms,
            embedding: coords,
            k,
            mean_distance,
            a,
            b,
        })
    }
}

impl FittedProjection for UmapModel {
    fn coordinates(&self) -> &[Point2] {
        &self.embedding
    }

    fn transform(&self, point: &[f64]) -> Result<Point2> {
        let n = self.embedding.len();
        if n == 0 {
            return Err(ProjectionError::NotFitted);
        }
        if point.len() != self.dimension() {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.dimension(),
                got: point.len(),
            });
        }
        if n == 1 {
            return Ok(self.embedding[0]);
        }

        let query = ArrayView1::from(point);
        let query_norm = query.dot(&query).sqrt();
        let neighbors = nearest(
            &self.data,
            &self.norms,
            query,
            query_norm,
            None,
            self.k,
            self.config.metric,
        );
        let distances: Vec<f64> = neighbors.iter().map(|&(_, d)| d).collect();
        let (sigma, rho) = smooth_knn_dist(&distances, self.mean_distance);
        let weights: Vec<(usize, f64)> = neighbors
            .iter()
            .map(|&(j, d)| (j, membership(d, rho, sigma)))
            .collect();

        let total: f64 = weights.iter().map(|&(_, w)| w).sum();
        let init = if total > 0.0 {
            let mut acc = [0.0, 0.0];
            for &(j, w) in &weights {
                acc[0] += w * self.embedding[j][0];
                acc[1] += w * self.embedding[j][1];
            }
            [acc[0] / total, acc[1] / total]
        } else {
            self.embedding[neighbors[0].0]
        };

        let mut coords = self.embedding.clone();
        coords.push(init);
        let edges: Vec<Edge> = weights
            .iter()
            .map(|&(j, w)| Edge {
                head: n,
                tail: j,
                weight: w,
            })
            .collect();

        let schedule = Schedule {
            a: self.a,
            b: self.b,
            gamma: self.config.repulsion_strength,
            initial_alpha: self.config.learning_rate / 4.0,
            n_epochs: self.config.transform_epochs,
            negative_sample_rate: self.config.negative_sample_rate,
            move_other: false,
            negative_pool: n,
        };
        let mut rng = StdRng::seed_from_u64(self.config.random_state);
        optimize_layout(&mut coords, &edges, &schedule, &mut rng);

        Ok(coords[n])
    }
}

fn to_matrix(data: &[Vec<f64>]) -> Result<Array2<f64>> {
    let dim = data[0].len();
    if dim == 0 {
        return Err(ProjectionError::InvalidConfig(
            "cannot project zero-length vectors".to_string(),
        ));
    }
    let mut flat = Vec::with_capacity(data.len() * dim);
    for row in data {
        if row.len() != dim {
            return Err(ProjectionError::DimensionMismatch {
                expected: dim,
                got: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((data.len(), dim), flat).map_err(|e| {
        ProjectionError::InvalidConfig(format!("failed to build training matrix: {}", e))
    })
}

fn row_norms(data: &Array2<f64>) -> Array1<f64> {
    data.rows().into_iter().map(|r| r.dot(&r).sqrt()).collect()
}

fn distance(
    metric: Metric,
    x: ArrayView1<f64>,
    x_norm: f64,
    y: ArrayView1<f64>,
    y_norm: f64,
) -> f64 {
    let dot = x.dot(&y);
    match metric {
        Metric::Cosine => {
            if x_norm == 0.0 || y_norm == 0.0 {
                1.0
            } else {
                (1.0 - dot / (x_norm * y_norm)).max(0.0)
            }
        }
        Metric::Euclidean => (x_norm * x_norm + y_norm * y_norm - 2.0 * dot).max(0.0).sqrt(),
    }
}

/// The `k` training rows closest to `query`, ascending by distance then index.
fn nearest(
    data: &Array2<f64>,
    norms: &Array1<f64>,
    query: ArrayView1<f64>,
    query_norm: f64,
    exclude: Option<usize>,
    k: usize,
    metric: Metric,
) -> Vec<(usize, f64)> {
    let mut candidates: Vec<(usize, f64)> = data
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(j, _)| Some(*j) != exclude)
        .map(|(j, row)| (j, distance(metric, query, query_norm, row, norms[j])))
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    candidates.truncate(k);
    candidates
}

/// Neighbor lists for every training row - parallel with the `parallel` feature
#[cfg(feature = "parallel")]
fn knn_graph(
    data: &Array2<f64>,
    norms: &Array1<f64>,
    k: usize,
    metric: Metric,
) -> Vec<Vec<(usize, f64)>> {
    (0..data.nrows())
        .into_par_iter()
        .map(|i| nearest(data, norms, data.row(i), norms[i], Some(i), k, metric))
        .collect()
}

/// Neighbor lists for every training row
#[cfg(not(feature = "parallel"))]
fn knn_graph(
    data: &Array2<f64>,
    norms: &Array1<f64>,
    k: usize,
    metric: Metric,
) -> Vec<Vec<(usize, f64)>> {
    (0..data.nrows())
        .map(|i| nearest(data, norms, data.row(i), norms[i], Some(i), k, metric))
        .collect()
}

/// Calibrates a point's bandwidth.
///
/// `rho` is the distance to the nearest non-identical neighbor; `sigma` is
/// binary-searched so the memberships of the (ascending) `distances` sum
/// to `log2(k)`. Returns `(sigma, rho)`.
fn smooth_knn_dist(distances: &[f64], mean_distance: f64) -> (f64, f64) {
    let target = (distances.len() as f64).log2();
    let rho = distances.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

    let mut lo = 0.0;
    let mut hi = f64::INFINITY;
    let mut mid = 1.0;
    for _ in 0..BANDWIDTH_ITERATIONS {
        let psum: f64 = distances.iter().map(|&d| membership(d, rho, mid)).sum();
        if (psum - target).abs() < SMOOTH_K_TOLERANCE {
            break;
        }
        if psum > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            if hi == f64::INFINITY {
                mid *= 2.0;
            } else {
                mid = (lo + hi) / 2.0;
            }
        }
    }

    let floor = if rho > 0.0 {
        let local_mean = distances.iter().sum::<f64>() / distances.len() as f64;
        MIN_K_DIST_SCALE * local_mean
    } else {
        MIN_K_DIST_SCALE * mean_distance
    };
    (mid.max(floor), rho)
}

fn membership(distance: f64, rho: f64, sigma: f64) -> f64 {
    let d = distance - rho;
    if d <= 0.0 || sigma <= 0.0 {
        1.0
    } else {
        (-d / sigma).exp()
    }
}

/// Symmetrizes directed memberships with the probabilistic t-conorm
/// `a + b - ab`, one undirected edge per pair.
fn fuzzy_union(directed: &BTreeMap<(usize, usize), f64>) -> Vec<Edge> {
    let mut undirected: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(i, j), &w) in directed {
        let key = (i.min(j), i.max(j));
        if undirected.contains_key(&key) {
            continue;
        }
        let reverse = directed.get(&(j, i)).copied().unwrap_or(0.0);
        undirected.insert(key, w + reverse - w * reverse);
    }
    undirected
        .into_iter()
        .filter(|&(_, w)| w > 0.0)
        .map(|((head, tail), weight)| Edge { head, tail, weight })
        .collect()
}

/// Fits `1 / (1 + a x^(2b))` to the offset exponential defined by
/// `spread` and `min_dist` with Levenberg-Marquardt.
fn find_ab_params(spread: f64, min_dist: f64) -> (f64, f64) {
    let xs: Vec<f64> = (0..CURVE_SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (CURVE_SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let curve = |x: f64, a: f64, b: f64| 1.0 / (1.0 + a * x.powf(2.0 * b));
    let cost = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| (curve(x, a, b) - y).powi(2))
            .sum()
    };

    let (mut a, mut b) = (1.0, 1.0);
    let mut current = cost(a, b);
    let mut lambda = 1e-3;

    for _ in 0..500 {
        let (mut h00, mut h01, mut h11, mut g0, mut g1) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(&ys) {
            if x <= 0.0 {
                continue;
            }
            let x2b = x.powf(2.0 * b);
            let denom = 1.0 + a * x2b;
            let r = 1.0 / denom - y;
            let da = -x2b / (denom * denom);
            let db = -2.0 * a * x2b * x.ln() / (denom * denom);
            h00 += da * da;
            h01 += da * db;
            h11 += db * db;
            g0 += da * r;
            g1 += db * r;
        }

        let m00 = h00 * (1.0 + lambda);
        let m11 = h11 * (1.0 + lambda);
        let det = m00 * m11 - h01 * h01;
        if det.abs() < f64::MIN_POSITIVE {
            break;
        }
        let step_a = -(m11 * g0 - h01 * g1) / det;
        let step_b = -(m00 * g1 - h01 * g0) / det;
        let (next_a, next_b) = (a + step_a, b + step_b);

        if next_a > 0.0 && next_b > 0.0 {
            let next = cost(next_a, next_b);
            if next < current {
                a = next_a;
                b = next_b;
                current = next;
                lambda = (lambda * 0.1).max(1e-12);
                if step_a.abs() + step_b.abs() < 1e-10 {
                    break;
                }
                continue;
            }
        }
        lambda *= 10.0;
        if lambda > 1e12 {
            break;
        }
    }
    (a, b)
}

/// Leading two principal components, scaled to `INIT_EXTENT` and jittered.
///
/// Rows are unit-normalized first under the cosine metric. Returns `None`
/// when the data has no variance.
fn pca_init(
    data: &Array2<f64>,
    norms: &Array1<f64>,
    metric: Metric,
    rng: &mut StdRng,
) -> Option<Vec<Point2>> {
    let mut rows = data.clone();
    if metric == Metric::Cosine {
        for (mut row, &n) in rows.rows_mut().into_iter().zip(norms.iter()) {
            if n > 0.0 {
                row.mapv_inplace(|x| x / n);
            }
        }
    }
    let mean = rows.mean_axis(Axis(0))?;
    let centered = &rows - &mean;

    let first = principal_axis(&centered, None, rng)?;
    let second = principal_axis(&centered, Some(&first), rng);

    let xs = centered.dot(&first);
    let ys = match &second {
        Some(axis) => centered.dot(axis),
        None => Array1::zeros(centered.nrows()),
    };
    let extent = xs
        .iter()
        .chain(ys.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    if extent == 0.0 {
        return None;
    }
    let factor = INIT_EXTENT / extent;

    Some(
        xs.iter()
            .zip(ys.iter())
            .map(|(&x, &y)| {
                [
                    x * factor + rng.gen_range(-INIT_NOISE..INIT_NOISE),
                    y * factor + rng.gen_range(-INIT_NOISE..INIT_NOISE),
                ]
            })
            .collect(),
    )
}

/// Power iteration, deflated against `previous` when given.
fn principal_axis(
    centered: &Array2<f64>,
    previous: Option<&Array1<f64>>,
    rng: &mut StdRng,
) -> Option<Array1<f64>> {
    let mut axis: Array1<f64> = (0..centered.ncols())
        .map(|_| rng.gen_range(-1.0..1.0))
        .collect();
    for _ in 0..POWER_ITERATIONS {
        let scores = centered.dot(&axis);
        let mut next = centered.t().dot(&scores);
        if let Some(prev) = previous {
            let overlap = next.dot(prev);
            next.scaled_add(-overlap, prev);
        }
        let len = next.dot(&next).sqrt();
        if len < 1e-12 {
            return None;
        }
        axis = next / len;
    }
    Some(axis)
}

fn random_init(n: usize, rng: &mut StdRng) -> Vec<Point2> {
    (0..n)
        .map(|_| {
            [
                rng.gen_range(-INIT_EXTENT..INIT_EXTENT),
                rng.gen_range(-INIT_EXTENT..INIT_EXTENT),
            ]
        })
        .collect()
}

fn clip(v: f64) -> f64 {
    v.clamp(-GRAD_CLIP, GRAD_CLIP)
}

fn dist_sq(x: Point2, y: Point2) -> f64 {
    (x[0] - y[0]).powi(2) + (x[1] - y[1]).powi(2)
}

/// Epoch-scheduled SGD: each edge is sampled in proportion to its weight,
/// with `negative_sample_rate` repulsive samples per attractive update.
fn optimize_layout(
    coords: &mut [Point2],
    edges: &[Edge],
    schedule: &Schedule,
    rng: &mut StdRng,
) {
    if edges.is_empty() || schedule.n_epochs == 0 {
        return;
    }
    let n_epochs = schedule.n_epochs as f64;
    let max_weight = edges.iter().fold(0.0f64, |m, e| m.max(e.weight));
    let edges: Vec<&Edge> = edges
        .iter()
        .filter(|e| e.weight >= max_weight / n_epochs)
        .collect();

    let epochs_per_sample: Vec<f64> = edges.iter().map(|e| max_weight / e.weight).collect();
    let epochs_per_negative: Vec<f64> = epochs_per_sample
        .iter()
        .map(|eps| eps / schedule.negative_sample_rate as f64)
        .collect();
    let mut next_sample = epochs_per_sample.clone();
    let mut next_negative = epochs_per_negative.clone();

    let (a, b) = (schedule.a, schedule.b);

    for epoch in 0..schedule.n_epochs {
        let n = epoch as f64;
        let alpha = schedule.initial_alpha * (1.0 - n / n_epochs);

        for (i, edge) in edges.iter().enumerate() {
            if next_sample[i] > n {
                continue;
            }
            let (j, k) = (edge.head, edge.tail);

            let current = coords[j];
            let other = coords[k];
            let d2 = dist_sq(current, other);
            let grad_coeff = if d2 > 0.0 {
                -2.0 * a * b * d2.powf(b - 1.0) / (a * d2.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..2 {
                let grad = clip(grad_coeff * (current[d] - other[d]));
                coords[j][d] += grad * alpha;
                if schedule.move_other {
                    coords[k][d] -= grad * alpha;
                }
            }
            next_sample[i] += epochs_per_sample[i];

            let n_neg = ((n - next_negative[i]) / epochs_per_negative[i]).max(0.0) as usize;
            for _ in 0..n_neg {
                let k = rng.gen_range(0..schedule.negative_pool);
                if k == j {
                    continue;
                }
                let current = coords[j];
                let other = coords[k];
                let d2 = dist_sq(current, other);
                let grad_coeff = if d2 > 0.0 {
                    2.0 * schedule.gamma * b / ((0.001 + d2) * (a * d2.powf(b) + 1.0))
                } else {
                    0.0
                };
                for d in 0..2 {
                    let grad = if grad_coeff > 0.0 {
                        clip(grad_coeff * (current[d] - other[d]))
                    } else {
                        GRAD_CLIP
                    };
                    coords[j][d] += grad * alpha;
                }
            }
            next_negative[i] += n_neg as f64 * epochs_per_negative[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tight clusters of `per_cluster` points around orthogonal axes.
    fn two_clusters(per_cluster: usize, dim: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Vec::new();
        for axis in 0..2 {
            for _ in 0..per_cluster {
                let mut v: Vec<f64> = (0..dim).map(|_| rng.gen_range(-0.05..0.05)).collect();
                v[axis] += 1.0;
                data.push(v);
            }
        }
        data
    }

    fn centroid(points: &[Point2]) -> Point2 {
        let n = points.len() as f64;
        let sum = points
            .iter()
            .fold([0.0, 0.0], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
        [sum[0] / n, sum[1] / n]
    }

    fn reducer() -> UmapReducer {
        UmapReducer::new(ProjectionConfig::default().with_n_neighbors(5)).unwrap()
    }

    #[test]
    fn test_curve_params_match_reference_defaults() {
        let (a, b) = find_ab_params(1.0, 0.1);
        assert!((a - 1.577).abs() < 0.05, "a = {}", a);
        assert!((b - 0.895).abs() < 0.05, "b = {}", b);
    }

    #[test]
    fn test_bandwidth_hits_log2_k() {
        let distances = [0.1, 0.2, 0.35, 0.5, 0.8, 1.3, 1.7, 2.0];
        let (sigma, rho) = smooth_knn_dist(&distances, 1.0);
        assert_eq!(rho, 0.1);
        let psum: f64 = distances.iter().map(|&d| membership(d, rho, sigma)).sum();
        assert!((psum - 3.0).abs() < 1e-4, "psum = {}", psum);
    }

    #[test]
    fn test_fuzzy_union_is_symmetric() {
        let mut directed = BTreeMap::new();
        directed.insert((0, 1), 0.5);
        directed.insert((1, 0), 0.5);
        directed.insert((1, 2), 1.0);
        let edges = fuzzy_union(&directed);
        assert_eq!(edges.len(), 2);
        assert!((edges[0].weight - 0.75).abs() < 1e-12);
        assert_eq!((edges[1].head, edges[1].tail), (1, 2));
        assert!((edges[1].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data = two_clusters(10, 8, 1);
        let first = reducer().fit(&data).unwrap();
        let second = reducer().fit(&data).unwrap();
        assert_eq!(first.coordinates(), second.coordinates());
        assert_eq!(first.n_points(), 20);
    }

    #[test]
    fn test_fit_separates_clusters() {
        let data = two_clusters(10, 8, 2);
        let model = reducer().fit(&data).unwrap();
        let coords = model.coordinates();
        let (left, right) = coords.split_at(10);
        let (ca, cb) = (centroid(left), centroid(right));
        let radius = |pts: &[Point2], c: Point2| {
            pts.iter()
                .map(|p| dist_sq(*p, c).sqrt())
                .fold(0.0f64, f64::max)
        };
        let gap = dist_sq(ca, cb).sqrt();
        assert!(
            gap > radius(left, ca).max(radius(right, cb)),
            "clusters overlap: gap {} vs radii {} / {}",
            gap,
            radius(left, ca),
            radius(right, cb)
        );
    }

    #[test]
    fn test_transform_lands_in_own_cluster() {
        let data = two_clusters(10, 8, 3);
        let model = reducer().fit(&data).unwrap();
        let (left, right) = model.coordinates().split_at(10);
        let (ca, cb) = (centroid(left), centroid(right));

        let mut probe = vec![0.01; 8];
        probe[0] = 1.0;
        let point = model.transform(&probe).unwrap();
        assert!(
            dist_sq(point, ca) < dist_sq(point, cb),
            "probe {:?} closer to wrong cluster ({:?} vs {:?})",
            point,
            ca,
            cb
        );
        assert_eq!(model.transform(&probe).unwrap(), point);
    }

    #[test]
    fn test_transform_does_not_move_training_layout() {
        let data = two_clusters(6, 4, 4);
        let model = reducer().fit(&data).unwrap();
        let before = model.coordinates().to_vec();
        model.transform(&data[0]).unwrap();
        assert_eq!(model.coordinates(), before.as_slice());
    }

    #[test]
    fn test_transform_dimension_mismatch() {
        let model = reducer().fit(&two_clusters(4, 4, 5)).unwrap();
        assert_eq!(
            model.transform(&[1.0, 0.0]),
            Err(ProjectionError::DimensionMismatch {
                expected: 4,
                got: 2
            })
        );
    }

    #[test]
    fn test_degenerate_sizes() {
        let empty = reducer().fit(&[]).unwrap();
        assert_eq!(empty.n_points(), 0);
        assert_eq!(empty.transform(&[1.0]), Err(ProjectionError::NotFitted));

        let single = reducer().fit(&[vec![0.2, 0.4]]).unwrap();
        assert_eq!(single.coordinates(), &[[0.0, 0.0]]);
        assert_eq!(single.transform(&[9.0, 9.0]).unwrap(), [0.0, 0.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = reducer()
            .fit(&[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]])
            .unwrap_err();
        assert_eq!(
            err,
            ProjectionError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_reducer_rejects_zero_negative_sampling() {
        let config = ProjectionConfig {
            negative_sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            UmapReducer::new(config),
            Err(ProjectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_circle_layout_keeps_points_apart() {
        let data: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 30.0;
                vec![angle.cos(), angle.sin(), 0.5]
            })
            .collect();
        let model = reducer().fit(&data).unwrap();
        let coords = model.coordinates();
        let mut distinct: Vec<Point2> = Vec::new();
        for p in coords {
            if !distinct.iter().any(|q| dist_sq(*p, *q) < 1e-12) {
                distinct.push(*p);
            }
        }
        assert_eq!(distinct.len(), 30);
    }

    #[test]
    fn test_identical_points_stay_finite() {
        let data = vec![vec![1.0, 1.0]; 6];
        let model = reducer().fit(&data).unwrap();
        assert!(model
            .coordinates()
            .iter()
            .all(|p| p[0].is_finite() && p[1].is_finite()));
        let p = model.transform(&[1.0, 1.0]).unwrap();
        assert!(p[0].is_finite() && p[1].is_finite());
    }
}
