//! Small numeric helpers: least-squares polynomial fits, a dense linear
//! solver and robust statistics.

/// Fit a polynomial of `degree` to `(t, v)` by least squares.
///
/// Returns coefficients in ascending order (`c0 + c1 t + c2 t^2 ...`), or
/// `None` when there are too few points or the normal equations are singular.
pub fn polyfit(times: &[f64], values: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = times.len();
    if n != values.len() || n <= degree {
        return None;
    }

    // Build Vandermonde matrix A where A[i,j] = t[i]^j
    let a: Vec<Vec<f64>> = times
        .iter()
        .map(|&t| {
            let mut row = Vec::with_capacity(degree + 1);
            let mut t_power = 1.0;
            for _ in 0..=degree {
                row.push(t_power);
                t_power *= t;
            }
            row
        })
        .collect();

    // Normal equations: (A^T A) c = A^T v
    let mut ata = vec![vec![0.0; degree + 1]; degree + 1];
    let mut atv = vec![0.0; degree + 1];
    for i in 0..=degree {
        for j in 0..=degree {
            ata[i][j] = (0..n).map(|k| a[k][i] * a[k][j]).sum();
        }
        atv[i] = (0..n).map(|k| a[k][i] * values[k]).sum();
    }

    let coeffs = solve_linear_system(&ata, &atv)?;
    coeffs.iter().all(|c| c.is_finite()).then_some(coeffs)
}

/// Evaluate a polynomial with ascending coefficients.
pub fn eval_polynomial(coeffs: &[f64], t: f64) -> f64 {
    let mut result = 0.0;
    let mut t_power = 1.0;
    for &c in coeffs {
        result += c * t_power;
        t_power *= t;
    }
    result
}

/// Root-mean-square residual of a polynomial fit.
pub fn fit_rmse(coeffs: &[f64], times: &[f64], values: &[f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    let sse: f64 = times
        .iter()
        .zip(values)
        .map(|(&t, &v)| (v - eval_polynomial(coeffs, t)).powi(2))
        .sum();
    (sse / times.len() as f64).sqrt()
}

/// Solve `Ax = b` using Gaussian elimination with partial pivoting.
pub fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    // Augmented matrix
    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .zip(b.iter())
        .map(|(row, &bi)| {
            let mut new_row = row.clone();
            new_row.push(bi);
            new_row
        })
        .collect();

    for col in 0..n {
        let (max_row, max_val) = (col..n)
            .map(|row| (row, aug[row][col].abs()))
            .fold((col, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_val < 1e-12 {
            return None; // Singular matrix
        }

        aug.swap(col, max_row);

        for row in (col + 1)..n {
            let factor = aug[row][col] / aug[col][col];
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| aug[i][j] * x[j]).sum();
        x[i] = (aug[i][n] - tail) / aug[i][i];
    }

    Some(x)
}

/// Least-squares line `v = intercept + slope * t`, with residual standard deviation.
pub fn linear_fit(ts: &[f64], vs: &[f64]) -> Option<(f64, f64, f64)> {
    let coeffs = polyfit(ts, vs, 1)?;
    let residual = fit_rmse(&coeffs, ts, vs);
    Some((coeffs[0], coeffs[1], residual))
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around the median.
pub fn mad(values: &[f64]) -> f64 {
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    median(&deviations)
}

/// Angle between two 2D vectors in degrees, `[0, 180]`.
pub fn angle_between_deg(a: (f64, f64), b: (f64, f64)) -> f64 {
    let norm = a.0.hypot(a.1) * b.0.hypot(b.1);
    if norm <= f64::EPSILON {
        return 0.0;
    }
    let cos = ((a.0 * b.0 + a.1 * b.1) / norm).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
