//! Descriptive statistics shared by the controller, analyzer and threshold
//! estimation.
//!
//! Every function here is total: empty input yields `0.0` (or `None` for
//! ratios), and ratios with a zero or non-finite denominator yield `None`
//! rather than NaN. Callers that must reject non-finite input do so before
//! reaching these helpers.

/// Arithmetic mean. `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Coefficient of variation `stddev / |mean|`.
///
/// Returns `None` when the slice is empty, the mean is zero, or the ratio is
/// not finite.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values);
    if m == 0.0 {
        return None;
    }
    let cv = population_std_dev(values) / m.abs();
    cv.is_finite().then_some(cv)
}

/// Median of the values. `0.0` for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Mean after dropping `trim_percent / 2` percent of the sorted values from
/// each tail.
///
/// The number dropped per tail is rounded down, so small samples may lose
/// nothing. If trimming would leave no values the plain mean is returned.
pub fn trimmed_mean(values: &[f64], trim_percent: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let per_tail = ((sorted.len() as f64) * (trim_percent / 100.0) / 2.0).floor() as usize;
    if per_tail * 2 >= sorted.len() {
        return mean(&sorted);
    }
    mean(&sorted[per_tail..sorted.len() - per_tail])
}

/// Ordinary least-squares slope of `values` against their index.
///
/// Returns `0.0` for fewer than two points.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// `max(0, min(1, 1 - cv))`; `0.0` when the CV is undefined.
pub fn stability_from_cv(cv: Option<f64>) -> f64 {
    cv.map_or(0.0, |cv| (1.0 - cv).clamp(0.0, 1.0))
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(mean(&values), 5.0));
        assert!(approx(population_variance(&values), 4.0));
        assert!(approx(population_std_dev(&values), 2.0));
    }

    #[test]
    fn test_empty_inputs_are_zero() {
        assert!(approx(mean(&[]), 0.0));
        assert!(approx(population_std_dev(&[]), 0.0));
        assert!(approx(median(&[]), 0.0));
        assert!(coefficient_of_variation(&[]).is_none());
    }

    #[test]
    fn test_cv_zero_mean_is_none() {
        assert!(coefficient_of_variation(&[-1.0, 1.0]).is_none());
        let cv = coefficient_of_variation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(cv, 0.4));
    }

    #[test]
    fn test_cv_uses_absolute_mean() {
        let cv = coefficient_of_variation(&[-2.0, -4.0]).unwrap();
        assert!(approx(cv, 1.0 / 3.0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert!(approx(median(&[3.0, 1.0, 2.0]), 2.0));
        assert!(approx(median(&[4.0, 1.0, 3.0, 2.0]), 2.5));
    }

    #[test]
    fn test_trimmed_mean_drops_tails() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        // 20% trim -> one value per tail
        assert!(approx(trimmed_mean(&values, 20.0), 5.5));
        // 0% trim is the plain mean
        assert!(approx(trimmed_mean(&values, 0.0), mean(&values)));
    }

    #[test]
    fn test_slope() {
        assert!(approx(least_squares_slope(&[1.0, 2.0, 3.0, 4.0]), 1.0));
        assert!(approx(least_squares_slope(&[4.0, 3.0, 2.0, 1.0]), -1.0));
        assert!(approx(least_squares_slope(&[5.0, 5.0, 5.0]), 0.0));
        assert!(approx(least_squares_slope(&[5.0]), 0.0));
    }

    #[test]
    fn test_stability_from_cv_clamps() {
        assert!(approx(stability_from_cv(Some(0.25)), 0.75));
        assert!(approx(stability_from_cv(Some(3.0)), 0.0));
        assert!(approx(stability_from_cv(None), 0.0));
    }
}
