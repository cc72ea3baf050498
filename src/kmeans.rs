use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

const MAX_ITERATIONS: usize = 100;

/// Lloyd's k-means with deterministic farthest-first seeding
#[derive(Debug, Clone)]
pub struct KMeans {
    centroids: Array2<f32>,
    labels: Vec<usize>,
}

fn squared_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(centroids: &Array2<f32>, sample: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = squared_distance(centroid, sample);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

impl KMeans {
    /// Clusters the rows of `samples` into `k` groups.
    ///
    /// Returns `None` when the rows hold fewer than `k` distinct values.
    pub fn fit(samples: ArrayView2<f32>, k: usize) -> Option<Self> {
        let n = samples.nrows();
        if k == 0 || n < k {
            return None;
        }

        // farthest-first seeding from the first row
        let mut seeds = vec![0usize];
        while seeds.len() < k {
            let (index, distance) = samples
                .axis_iter(Axis(0))
                .enumerate()
                .map(|(i, row)| {
                    let d = seeds
                        .iter()
                        .map(|&s| squared_distance(samples.row(s), row))
                        .fold(f32::INFINITY, f32::min);
                    (i, d)
                })
                .fold((0, 0.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });
            if distance <= 0.0 {
                return None;
            }
            seeds.push(index);
        }

        let mut centroids = samples.select(Axis(0), &seeds);
        let mut labels = vec![usize::MAX; n];

        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for (i, row) in samples.axis_iter(Axis(0)).enumerate() {
                let label = nearest(&centroids, row);
                if labels[i] != label {
                    labels[i] = label;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            for cluster in 0..k {
                let members: Vec<usize> = (0..n).filter(|&i| labels[i] == cluster).collect();
                if members.is_empty() {
                    continue;
                }
                let mean: Array1<f32> = samples
                    .select(Axis(0), &members)
                    .mean_axis(Axis(0))
                    .unwrap_or_else(|| centroids.row(cluster).to_owned());
                centroids.row_mut(cluster).assign(&mean);
            }
        }

        Some(Self { centroids, labels })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn centroid(&self, cluster: usize) -> ArrayView1<'_, f32> {
        self.centroids.row(cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_two_obvious_groups() {
        let samples = array![
            [0.0f32, 0.0, 0.0],
            [250.0, 250.0, 250.0],
            [2.0, 1.0, 0.0],
            [245.0, 255.0, 250.0],
            [1.0, 3.0, 2.0],
        ];
        let model = KMeans::fit(samples.view(), 2).unwrap();
        let labels = model.labels();
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[0], labels[4]);
        assert_eq!(labels[1], labels[3]);
        assert_ne!(labels[0], labels[1]);

        let dark = model.centroid(labels[0]);
        assert!((dark[0] - 1.0).abs() < 1e-4);
        let light = model.centroid(labels[1]);
        assert!((light[0] - 247.5).abs() < 1e-4);
    }

    #[test]
    fn test_uniform_samples_are_degenerate() {
        let samples = Array2::from_elem((12, 3), 90.0f32);
        assert!(KMeans::fit(samples.view(), 2).is_none());
    }

    #[test]
    fn test_too_few_samples() {
        let samples = array![[1.0f32, 2.0, 3.0]];
        assert!(KMeans::fit(samples.view(), 2).is_none());
    }
}
