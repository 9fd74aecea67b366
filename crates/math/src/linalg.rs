//! Linear algebra operations for factor-model estimation.

use ndarray::{Array1, Array2};

use crate::MathError;

/// Pivots smaller than this fraction of the largest diagonal entry of `X'X`
/// are treated as zero.
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of an ordinary least squares fit.
#[derive(Debug, Clone)]
pub struct OlsResult {
    /// Estimated coefficients (p,).
    pub coefficients: Array1<f64>,
    /// Fitted values `X * beta` (n,).
    pub fitted: Array1<f64>,
    /// Residuals `y - X * beta` (n,).
    pub residuals: Array1<f64>,
}

/// Perform ordinary least squares regression.
///
/// Solves: argmin_beta sum((y_i - X_i * beta)^2)
///
/// No intercept is added; include a column of ones in `x` to fit one.
///
/// # Arguments
/// * `y` - Response vector (n,)
/// * `x` - Design matrix (n x p)
///
/// # Errors
/// Returns `MathError::Singular` when `X'X` is rank deficient,
/// `MathError::Underdetermined` when n < p, and
/// `MathError::NumericalInstability` on non-finite input or output.
pub fn ordinary_least_squares(y: &Array1<f64>, x: &Array2<f64>) -> Result<OlsResult, MathError> {
    let n = y.len();
    let p = x.ncols();

    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if n == 0 || p == 0 {
        return Err(MathError::EmptyData);
    }
    if n < p {
        return Err(MathError::Underdetermined { observations: n, unknowns: p });
    }
    if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite input".to_string()));
    }

    // Normal equations: (X'X) beta = X'y
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    let coefficients = solve_linear_system(&xtx, &xty)?;
    if coefficients.iter().any(|b| !b.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite coefficients".to_string()));
    }

    let fitted = x.dot(&coefficients);
    let residuals = y - &fitted;

    Ok(OlsResult { coefficients, fitted, residuals })
}

/// Solve a linear system Ax = b using Gaussian elimination with partial pivoting.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    let scale = (0..n).map(|i| a[[i, i]].abs()).fold(0.0_f64, f64::max);
    if scale == 0.0 {
        return Err(MathError::Singular);
    }
    let tolerance = scale * RELATIVE_PIVOT_TOLERANCE;

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val <= tolerance {
            return Err(MathError::Singular);
        }

        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}
