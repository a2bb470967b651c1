//! Penalised least squares for additive regression models
//!
//! Solves `(X'X + diag(penalties)) beta = X'y` through a Cholesky
//! factorisation. The inverse of the penalised normal matrix is kept so
//! callers can derive prediction variances and effective degrees of freedom.

use crate::{MathError, Result};

/// Result of a ridge least squares fit
#[derive(Debug, Clone)]
pub struct RidgeFit {
    coefficients: Vec<f64>,
    /// Inverse of the penalised normal matrix `(X'X + Λ)^-1`
    inverse: Vec<Vec<f64>>,
    effective_dof: f64,
    residual_sum_squares: f64,
    observations: usize,
}

impl RidgeFit {
    /// Fitted coefficients, one per design column
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Trace of the hat matrix; equals the column count when no penalty applies
    pub fn effective_dof(&self) -> f64 {
        self.effective_dof
    }

    /// Residual sum of squares over the training rows
    pub fn residual_sum_squares(&self) -> f64 {
        self.residual_sum_squares
    }

    /// Residual variance with the effective degrees of freedom removed
    pub fn residual_variance(&self) -> f64 {
        let dof = (self.observations as f64 - self.effective_dof).max(1.0);
        self.residual_sum_squares / dof
    }

    /// Evaluate the fitted linear predictor for a design row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        Ok(dot(&self.coefficients, row))
    }

    /// Quadratic form `x' (X'X + Λ)^-1 x` used for prediction intervals
    pub fn leverage(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        let leverage = self
            .inverse
            .iter()
            .zip(row)
            .map(|(inv_row, &x_i)| x_i * dot(inv_row, row))
            .sum::<f64>();
        // Round-off can push a true zero slightly negative
        Ok(leverage.max(0.0))
    }

    fn check_row(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Design row has {} columns, fit has {}",
                row.len(),
                self.coefficients.len()
            )));
        }
        Ok(())
    }
}

/// Fit `targets ≈ design * beta` with an L2 penalty per column
///
/// # Arguments
/// * `design` - Row-major design matrix, every row the same width
/// * `targets` - One target per design row
/// * `penalties` - Non-negative ridge penalty per column (0 leaves a column unpenalised)
pub fn ridge_least_squares(
    design: &[Vec<f64>],
    targets: &[f64],
    penalties: &[f64],
) -> Result<RidgeFit> {
    if design.is_empty() {
        return Err(MathError::InsufficientData(
            "Design matrix has no rows".to_string(),
        ));
    }
    if design.len() != targets.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but {} targets were supplied",
            design.len(),
            targets.len()
        )));
    }

    let p = penalties.len();
    if p == 0 {
        return Err(MathError::InvalidInput(
            "At least one design column is required".to_string(),
        ));
    }
    if design.iter().any(|row| row.len() != p) {
        return Err(MathError::InvalidInput(format!(
            "Every design row must have {} columns",
            p
        )));
    }
    if penalties.iter().any(|&l| !l.is_finite() || l < 0.0) {
        return Err(MathError::InvalidInput(
            "Penalties must be finite and non-negative".to_string(),
        ));
    }
    if design.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Design and targets must be finite".to_string(),
        ));
    }

    // Normal equations
    let mut gram = vec![vec![0.0; p]; p];
    let mut moment = vec![0.0; p];
    for (row, &y) in design.iter().zip(targets) {
        for i in 0..p {
            moment[i] += row[i] * y;
            for j in 0..=i {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            gram[j][i] = gram[i][j];
        }
    }

    let mut penalised = gram.clone();
    for (i, &lambda) in penalties.iter().enumerate() {
        penalised[i][i] += lambda;
    }

    let lower = cholesky(&penalised)?;
    let coefficients = cholesky_solve(&lower, &moment);

    let mut inverse = vec![vec![0.0; p]; p];
    for j in 0..p {
        let mut unit = vec![0.0; p];
        unit[j] = 1.0;
        let column = cholesky_solve(&lower, &unit);
        for i in 0..p {
            inverse[i][j] = column[i];
        }
    }

    // tr((X'X + Λ)^-1 X'X)
    let effective_dof = (0..p)
        .map(|i| (0..p).map(|k| inverse[i][k] * gram[k][i]).sum::<f64>())
        .sum::<f64>();

    let residual_sum_squares = design
        .iter()
        .zip(targets)
        .map(|(row, &y)| (y - dot(&coefficients, row)).powi(2))
        .sum::<f64>();

    Ok(RidgeFit {
        coefficients,
        inverse,
        effective_dof,
        residual_sum_squares,
        observations: targets.len(),
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Lower-triangular `L` with `L L' = matrix`
fn cholesky(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    let scale = (0..n)
        .map(|i| matrix[i][i].abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let tolerance = scale * 1e-13;

    let mut lower = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let partial = (0..j).map(|k| lower[i][k] * lower[j][k]).sum::<f64>();
            if i == j {
                let pivot = matrix[i][i] - partial;
                if pivot <= tolerance {
                    return Err(MathError::CalculationError(format!(
                        "Normal matrix is not positive definite (pivot {} at column {})",
                        pivot, i
                    )));
                }
                lower[i][j] = pivot.sqrt();
            } else {
                lower[i][j] = (matrix[i][j] - partial) / lower[j][j];
            }
        }
    }
    Ok(lower)
}

fn cholesky_solve(lower: &[Vec<f64>], rhs: &[f64]) -> Vec<f64> {
    let n = lower.len();

    // Forward substitution: L z = rhs
    let mut z = vec![0.0; n];
    for i in 0..n {
        let partial = (0..i).map(|k| lower[i][k] * z[k]).sum::<f64>();
        z[i] = (rhs[i] - partial) / lower[i][i];
    }

    // Back substitution: L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let partial = (i + 1..n).map(|k| lower[k][i] * x[k]).sum::<f64>();
        x[i] = (z[i] - partial) / lower[i][i];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_design(xs: &[f64]) -> Vec<Vec<f64>> {
        xs.iter().map(|&x| vec![1.0, x]).collect()
    }

    #[test]
    fn test_exact_line_recovered() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 + 2.0 * x).collect();

        let fit = ridge_least_squares(&line_design(&xs), &ys, &[0.0, 0.0]).unwrap();

        assert_relative_eq!(fit.coefficients()[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients()[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.effective_dof(), 2.0, epsilon = 1e-9);
        assert!(fit.residual_sum_squares() < 1e-18);
        assert_relative_eq!(fit.predict(&[1.0, 10.0]).unwrap(), 23.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficient() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 2.0, 3.0];
        let design: Vec<Vec<f64>> = xs.iter().map(|&x| vec![x]).collect();

        let free = ridge_least_squares(&design, &ys, &[0.0]).unwrap();
        let shrunk = ridge_least_squares(&design, &ys, &[14.0]).unwrap();

        assert_relative_eq!(free.coefficients()[0], 1.0, epsilon = 1e-12);
        // sum x^2 = 14, so the penalty halves the slope
        assert_relative_eq!(shrunk.coefficients()[0], 0.5, epsilon = 1e-12);
        assert!(shrunk.effective_dof() < free.effective_dof());
    }

    #[test]
    fn test_leverage_grows_outside_training_range() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, 2.1, 2.9, 4.2, 5.0];
        let fit = ridge_least_squares(&line_design(&xs), &ys, &[0.0, 0.0]).unwrap();

        let centre = fit.leverage(&[1.0, 2.0]).unwrap();
        let far = fit.leverage(&[1.0, 10.0]).unwrap();
        assert_relative_eq!(centre, 0.2, epsilon = 1e-9);
        assert!(far > centre);
    }

    #[test]
    fn test_singular_design_rejected() {
        // Two identical columns with no penalty
        let design = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let result = ridge_least_squares(&design, &[1.0, 2.0, 3.0], &[0.0, 0.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));

        // The same design becomes solvable once penalised
        let result = ridge_least_squares(&design, &[1.0, 2.0, 3.0], &[1e-3, 1e-3]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_shape_validation() {
        assert!(ridge_least_squares(&[], &[], &[0.0]).is_err());
        assert!(ridge_least_squares(&[vec![1.0]], &[1.0, 2.0], &[0.0]).is_err());
        assert!(ridge_least_squares(&[vec![1.0, 2.0]], &[1.0], &[0.0]).is_err());
        assert!(ridge_least_squares(&[vec![1.0]], &[1.0], &[-1.0]).is_err());
        assert!(ridge_least_squares(&[vec![f64::NAN]], &[1.0], &[0.0]).is_err());

        let fit = ridge_least_squares(&[vec![1.0], vec![1.0]], &[1.0, 3.0], &[0.0]).unwrap();
        assert!(fit.predict(&[1.0, 2.0]).is_err());
    }
}
