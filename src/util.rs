/// Computes the arithmetic mean of a slice of values. Returns `None` for
/// empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Pearson correlation over pairwise-complete observations.
///
/// Rows where either side is missing are dropped. Returns `None` when
/// fewer than two complete pairs remain or either side has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let (xv, yv): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
    let mx = mean(&xv)?;
    let my = mean(&yv)?;
    let sx = stddev(&xv, mx);
    let sy = stddev(&yv, my);

    if sx == 0.0 || sy == 0.0 {
        return None;
    }

    let cov = xv
        .iter()
        .zip(yv.iter())
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / xv.len() as f64;

    Some(cov / (sx * sy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_normal_values() {
        assert_eq!(mean(&[50.0, 60.0]), Some(55.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_stddev_constant_series() {
        assert_eq!(stddev(&[5.0, 5.0, 5.0], 5.0), 0.0);
    }

    #[test]
    fn test_pearson_perfect_positive() {
        let xs = vec![Some(1.0), Some(2.0), Some(3.0)];
        let ys = vec![Some(10.0), Some(20.0), Some(30.0)];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_skips_incomplete_pairs() {
        let xs = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let ys = vec![Some(2.0), Some(99.0), Some(6.0), Some(8.0)];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance_is_none() {
        let xs = vec![Some(1.0), Some(1.0), Some(1.0)];
        let ys = vec![Some(2.0), Some(4.0), Some(6.0)];
        assert_eq!(pearson(&xs, &ys), None);
    }
}
