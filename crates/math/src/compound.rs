//! Return compounding.

/// Scale of returns quoted in percent.
pub const PERCENT: f64 = 100.0;

/// Compounding index of a return path.
///
/// `index[k] = prod_{i <= k} (1 + r_i / scale)`. Missing returns leave the
/// index unchanged for that day.
///
/// # Arguments
/// * `returns` - Returns in order, `None` for missing days
/// * `scale` - `1.0` for fractional returns, [`PERCENT`] for percent
#[must_use]
pub fn compound_index(returns: &[Option<f64>], scale: f64) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |level, r| {
            if let Some(r) = r.filter(|r| r.is_finite()) {
                *level *= 1.0 + r / scale;
            }
            Some(*level)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn compound_percent_path() {
        let path = [Some(0.5), Some(-0.2), Some(0.1), Some(0.0), Some(0.3), Some(1.2)];
        let index = compound_index(&path, PERCENT);

        assert_eq!(index.len(), 6);
        assert_relative_eq!(index[0], 1.005, epsilon = 1e-12);
        let expected = 1.005 * 0.998 * 1.001 * 1.0 * 1.003 * 1.012;
        assert_relative_eq!(index[5], expected, epsilon = 1e-12);
        assert_relative_eq!(index[5] - 1.0, 0.019_089, epsilon = 1e-5);
    }

    #[test]
    fn compound_carries_through_missing_days() {
        let index = compound_index(&[Some(0.1), None, Some(-0.1)], 1.0);
        assert_relative_eq!(index[0], 1.1, epsilon = 1e-12);
        assert_relative_eq!(index[1], 1.1, epsilon = 1e-12);
        assert_relative_eq!(index[2], 0.99, epsilon = 1e-12);
    }

    #[test]
    fn compound_empty() {
        assert!(compound_index(&[], PERCENT).is_empty());
    }
}
