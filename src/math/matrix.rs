use rand::Rng;
use std::f64::consts::PI;

/// Dense row-major matrix of `f64`.
///
/// Weight matrices are stored as `(outputs, inputs)`: row `j` holds the
/// incoming weights of output neuron `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Zero-mean Gaussian initialization with a fixed standard deviation.
    ///
    /// Rows are filled in order, so a seeded `rng` gives a reproducible matrix.
    pub fn gaussian<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// Builds a matrix from rows. All rows must have the same length.
    ///
    /// # Panics
    /// Panics when rows are ragged.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        assert!(
            data.iter().all(|row| row.len() == cols),
            "Matrix rows must all have the same length"
        );
        Matrix { rows, cols, data }
    }

    /// Matrix-vector product `self · v`, one explicit dot product per row.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.cols, v.len());
        self.data
            .iter()
            .map(|row| row.iter().zip(v).map(|(w, x)| w * x).sum())
            .collect()
    }

    /// Transposed product `selfᵀ · v`, used to push deltas back one layer.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.rows, v.len());
        let mut res = vec![0.0; self.cols];
        for (row, &d) in self.data.iter().zip(v) {
            for (acc, w) in res.iter_mut().zip(row) {
                *acc += d * w;
            }
        }
        res
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fills a vector of length `len` from N(0, std_dev).
pub fn gaussian_vec<R: Rng + ?Sized>(len: usize, std_dev: f64, rng: &mut R) -> Vec<f64> {
    (0..len)
        .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
        .collect()
}
