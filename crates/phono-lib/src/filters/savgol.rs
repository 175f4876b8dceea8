/// Savitzky–Golay smoother: a local least-squares polynomial fit over a
/// sliding odd-length window.
///
/// Interior samples use the centered fit. The first and last `window / 2`
/// samples are taken from the polynomial fitted to the first/last full window,
/// evaluated at the edge positions.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
    /// Least-squares projection onto the polynomial basis:
    /// `order + 1` rows of `window` weights, positions scaled to `[-1, 1]`.
    projection: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    /// Returns `None` when the window is even or too short for the order.
    pub fn new(window: usize, order: usize) -> Option<Self> {
        if window % 2 == 0 || window <= order {
            return None;
        }
        let half = window / 2;
        let positions: Vec<f64> = (0..window)
            .map(|i| (i as f64 - half as f64) / half.max(1) as f64)
            .collect();
        let terms = order + 1;

        // Normal equations (AᵀA) P = Aᵀ with A[i][j] = x_i^j.
        let mut normal = vec![vec![0.0; terms]; terms];
        for (r, row) in normal.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = positions.iter().map(|x| x.powi((r + c) as i32)).sum();
            }
        }
        let design_t: Vec<Vec<f64>> = (0..terms)
            .map(|j| positions.iter().map(|x| x.powi(j as i32)).collect())
            .collect();
        let projection = solve(normal, design_t)?;
        Some(Self {
            window,
            order,
            projection,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Weights that evaluate the window's fit at `offset` samples from its center.
    pub fn weights_at(&self, offset: isize) -> Vec<f64> {
        let half = (self.window / 2).max(1) as f64;
        let u = offset as f64 / half;
        let mut weights = vec![0.0; self.window];
        let mut power = 1.0;
        for row in &self.projection {
            for (w, p) in weights.iter_mut().zip(row) {
                *w += power * p;
            }
            power *= u;
        }
        weights
    }

    /// Smooth `data`. Inputs shorter than the window are returned unchanged.
    pub fn smooth(&self, data: &[f64]) -> Vec<f64> {
        let n = data.len();
        if n < self.window {
            return data.to_vec();
        }
        let half = self.window / 2;
        let center = self.weights_at(0);
        let mut out = vec![0.0; n];
        for i in half..n - half {
            out[i] = dot(&center, &data[i - half..=i + half]);
        }
        self.fill_edges(data, &mut out);
        out
    }

    /// Overwrite the first and last `window / 2` outputs with the edge fits.
    pub fn fill_edges(&self, data: &[f64], out: &mut [f64]) {
        let n = data.len();
        if n < self.window || out.len() != n {
            return;
        }
        let half = self.window / 2;
        let head = &data[..self.window];
        let tail = &data[n - self.window..];
        for i in 0..half {
            let offset = i as isize - half as isize;
            out[i] = dot(&self.weights_at(offset), head);
            out[n - 1 - i] = dot(&self.weights_at(-offset), tail);
        }
    }
}

fn dot(weights: &[f64], data: &[f64]) -> f64 {
    weights.iter().zip(data).map(|(w, x)| w * x).sum()
}

/// Gauss–Jordan elimination with partial pivoting, solving `a · X = b` for
/// a square `a` and a multi-column right-hand side `b` (one row per equation).
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let m = a.len();
    for col in 0..m {
        let pivot = (col..m).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        let diag = a[col][col];
        for x in a[col].iter_mut() {
            *x /= diag;
        }
        for x in b[col].iter_mut() {
            *x /= diag;
        }
        for row in 0..m {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..m {
                a[row][k] -= factor * a[col][k];
            }
            for k in 0..b[row].len() {
                b[row][k] -= factor * b[col][k];
            }
        }
    }
    Some(b)
}
