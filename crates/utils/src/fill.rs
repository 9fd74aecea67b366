//! Gap filling and simple returns.

/// Forward fill missing values.
///
/// Leading gaps stay missing. Non-finite values count as missing.
#[must_use]
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if let Some(v) = v.filter(|v| v.is_finite()) {
                last = Some(v);
            }
            last
        })
        .collect()
}

/// Simple change versus the previous element: `v[i] / v[i-1] - 1`.
///
/// The first element, and any element whose base is missing or zero, is `None`.
#[must_use]
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    out.push(None);
    out.extend(values.windows(2).map(|w| ratio_change(w[0], w[1])));
    out.truncate(values.len());
    out
}

/// Simple change to the next element: `v[i+1] / v[i] - 1`.
///
/// The last element is `None`.
#[must_use]
pub fn next_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out: Vec<Option<f64>> = values.windows(2).map(|w| ratio_change(w[0], w[1])).collect();
    if !values.is_empty() {
        out.push(None);
    }
    out
}

fn ratio_change(base: Option<f64>, next: Option<f64>) -> Option<f64> {
    match (base, next) {
        (Some(b), Some(n)) if b != 0.0 && b.is_finite() && n.is_finite() => Some(n / b - 1.0),
        _ => None,
    }
}
