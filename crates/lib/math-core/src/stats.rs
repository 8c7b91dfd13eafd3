//! Descriptive statistics and the classical tests.
//!
//! Results mirror the conventions of the common scientific stacks: sample
//! (`ddof = 1`) dispersion, linearly interpolated percentiles, pooled
//! two-sample t-tests, and tau-b for Kendall's coefficient.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::erf::erfc;
use statrs::statistics::Statistics;

use crate::error::{MathError, MathResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub percentiles: Percentiles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub statistic: f64,
    pub pvalue: f64,
    pub degrees_of_freedom: usize,
    pub significant: bool,
    pub test_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation: f64,
    pub pvalue: f64,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub pvalue: f64,
    pub equation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub smoothed: Vec<f64>,
    pub original: Vec<f64>,
    pub window: i64,
    pub method: String,
}

/// Which tail(s) a t-test reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Greater,
    Less,
}

impl Alternative {
    /// # Errors
    /// Returns [`MathError::InvalidInput`] for anything other than
    /// `two-sided`, `greater`, or `less`.
    pub fn parse(name: &str) -> MathResult<Self> {
        match name {
            "two-sided" => Ok(Self::TwoSided),
            "greater" => Ok(Self::Greater),
            "less" => Ok(Self::Less),
            _ => Err(MathError::invalid(
                "alternative must be one of: ['two-sided', 'greater', 'less']",
            )),
        }
    }
}

fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values = data.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

/// Linear-interpolation percentile of already sorted data.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q / 100.0;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;
    (sorted[hi] - sorted[lo]).mul_add(frac, sorted[lo])
}

/// Summary statistics of `data`.
///
/// # Errors
/// Fails on an empty slice.
pub fn describe_data(data: &[f64]) -> MathResult<Description> {
    if data.is_empty() {
        return Err(MathError::invalid("Data array cannot be empty"));
    }
    let values = sorted(data);
    let count = values.len();
    let (std, variance) = if count < 2 {
        (0.0, 0.0)
    } else {
        (data.iter().std_dev(), data.iter().variance())
    };
    let min = values[0];
    let max = values[count - 1];
    Ok(Description {
        count,
        mean: data.iter().mean(),
        median: percentile(&values, 50.0),
        std,
        variance,
        min,
        max,
        range: max - min,
        percentiles: Percentiles {
            p25: percentile(&values, 25.0),
            p50: percentile(&values, 50.0),
            p75: percentile(&values, 75.0),
            p95: percentile(&values, 95.0),
            p99: percentile(&values, 99.0),
        },
    })
}

fn students_t(df: f64) -> MathResult<StudentsT> {
    StudentsT::new(0.0, 1.0, df).map_err(|err| MathError::evaluation(err.to_string()))
}

fn t_pvalue(t: f64, df: f64, alternative: Alternative) -> MathResult<f64> {
    let dist = students_t(df)?;
    Ok(match alternative {
        Alternative::TwoSided => (2.0 * dist.sf(t.abs())).min(1.0),
        Alternative::Greater => dist.sf(t),
        Alternative::Less => dist.cdf(t),
    })
}

/// One-sample t-test against a zero mean, or pooled two-sample t-test.
///
/// # Errors
/// Fails on empty samples, an unknown alternative, too few observations, or
/// zero variance.
pub fn ttest(sample1: &[f64], sample2: Option<&[f64]>, alternative: &str) -> MathResult<TTestResult> {
    if sample1.is_empty() {
        return Err(MathError::invalid("sample1 cannot be empty"));
    }
    let alternative = Alternative::parse(alternative)?;
    let n1 = sample1.len();
    let (statistic, df, test_type) = match sample2 {
        None => {
            if n1 < 2 {
                return Err(MathError::invalid("sample1 needs at least two values for a one-sample t-test"));
            }
            let se = sample1.iter().std_dev() / (n1 as f64).sqrt();
            if se == 0.0 {
                return Err(MathError::invalid("Cannot compute a t statistic: sample has zero variance"));
            }
            (sample1.iter().mean() / se, n1 - 1, "one-sample")
        }
        Some(sample2) => {
            if sample2.is_empty() {
                return Err(MathError::invalid("sample2 cannot be empty"));
            }
            let n2 = sample2.len();
            let df = n1 + n2 - 2;
            if df == 0 {
                return Err(MathError::invalid("Two-sample t-test needs at least three values in total"));
            }
            let ss = |s: &[f64]| if s.len() < 2 { 0.0 } else { s.iter().variance() * (s.len() - 1) as f64 };
            let pooled = (ss(sample1) + ss(sample2)) / df as f64;
            let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
            if se == 0.0 {
                return Err(MathError::invalid("Cannot compute a t statistic: samples have zero variance"));
            }
            let diff = sample1.iter().mean() - sample2.iter().mean();
            (diff / se, df, "two-sample")
        }
    };
    let pvalue = t_pvalue(statistic, df as f64, alternative)?;
    Ok(TTestResult {
        statistic,
        pvalue,
        degrees_of_freedom: df,
        significant: pvalue < 0.05,
        test_type: test_type.to_string(),
    })
}

fn check_pair(x: &[f64], y: &[f64]) -> MathResult<()> {
    if x.is_empty() || y.is_empty() {
        return Err(MathError::invalid("Both x_data and y_data must be non-empty"));
    }
    if x.len() != y.len() {
        return Err(MathError::invalid(format!(
            "x_data and y_data must have the same length. Got {} and {}",
            x.len(),
            y.len()
        )));
    }
    Ok(())
}

/// Centered sums of squares and cross products: `(sxx, sxy, syy)`.
fn moments(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let mx = x.iter().mean();
    let my = y.iter().mean();
    x.iter().zip(y).fold((0.0, 0.0, 0.0), |(sxx, sxy, syy), (a, b)| {
        let (dx, dy) = (a - mx, b - my);
        (dx.mul_add(dx, sxx), dx.mul_add(dy, sxy), dy.mul_add(dy, syy))
    })
}

fn pearson(x: &[f64], y: &[f64]) -> MathResult<(f64, f64)> {
    let (sxx, sxy, syy) = moments(x, y);
    if sxx == 0.0 || syy == 0.0 {
        return Err(MathError::invalid(
            "Correlation is undefined when an input array is constant",
        ));
    }
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let n = x.len();
    if n == 2 || r.abs() == 1.0 {
        let p = if n == 2 { 1.0 } else { 0.0 };
        return Ok((r, p));
    }
    let df = (n - 2) as f64;
    let t = r * (df / ((1.0 - r) * (1.0 + r))).sqrt();
    Ok((r, t_pvalue(t, df, Alternative::TwoSided)?))
}

/// Ranks with ties sharing their average rank (1-based).
fn average_ranks(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));
    let mut ranks = vec![0.0; data.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && data[order[end]] == data[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Tie statistics of one variable: pair count, `sum t(t-1)(t-2)`, and
/// `sum t(t-1)(2t+5)` over tie groups of size `t`.
fn tie_terms(data: &[f64]) -> (f64, f64, f64) {
    let values = sorted(data);
    let mut terms = (0.0, 0.0, 0.0);
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && values[end] == values[start] {
            end += 1;
        }
        let t = (end - start) as f64;
        if t > 1.0 {
            terms.0 += t * (t - 1.0) / 2.0;
            terms.1 += t * (t - 1.0) * (t - 2.0);
            terms.2 += t * (t - 1.0) * 2.0f64.mul_add(t, 5.0);
        }
        start = end;
    }
    terms
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Exact two-sided p-value of Kendall's statistic for `n` untied pairs with
/// `c = min(discordant, total - discordant)`.
fn kendall_exact(n: usize, c: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    if c == 0 {
        return (2.0 / factorial(n)).min(1.0);
    }
    if c == 1 {
        return (2.0 / factorial(n - 1)).min(1.0);
    }
    if 2 * c == n * (n - 1) / 2 {
        return 1.0;
    }
    let mut counts = vec![0.0f64; c + 1];
    counts[0] = 1.0;
    counts[1] = 1.0;
    for j in 3..=n {
        let mut running = 0.0;
        for value in &mut counts {
            running += *value;
            *value = running;
        }
        if j <= c {
            for k in (j..=c).rev() {
                counts[k] -= counts[k - j];
            }
        }
    }
    (2.0 * counts.iter().sum::<f64>() / factorial(n)).min(1.0)
}

fn kendall(x: &[f64], y: &[f64]) -> MathResult<(f64, f64)> {
    let n = x.len();
    let mut concordant = 0usize;
    let mut discordant = 0usize;
    for i in 0..n {
        for j in i + 1..n {
            let dx = x[i].total_cmp(&x[j]);
            let dy = y[i].total_cmp(&y[j]);
            match (dx, dy) {
                (Ordering::Equal, _) | (_, Ordering::Equal) => {}
                (a, b) if a == b => concordant += 1,
                _ => discordant += 1,
            }
        }
    }
    let (xtie, x0, x1) = tie_terms(x);
    let (ytie, y0, y1) = tie_terms(y);
    let total = (n * (n - 1) / 2) as f64;
    if total == xtie || total == ytie {
        return Err(MathError::invalid(
            "Correlation is undefined when an input array is constant",
        ));
    }
    let score = concordant as f64 - discordant as f64;
    let tau = (score / (total - xtie).sqrt() / (total - ytie).sqrt()).clamp(-1.0, 1.0);

    let total_pairs = n * (n - 1) / 2;
    let c = discordant.min(total_pairs - discordant);
    let pvalue = if xtie == 0.0 && ytie == 0.0 && (n <= 33 || c <= 1) {
        kendall_exact(n, c)
    } else {
        let m = n as f64 * (n as f64 - 1.0);
        let nf = n as f64;
        let var = (m * 2.0f64.mul_add(nf, 5.0) - x1 - y1) / 18.0
            + (2.0 * xtie * ytie) / m
            + x0 * y0 / (9.0 * m * (nf - 2.0));
        let z = score / var.sqrt();
        erfc(z.abs() / std::f64::consts::SQRT_2)
    };
    Ok((tau, pvalue))
}

/// Correlation coefficient and two-sided p-value.
///
/// # Errors
/// Fails on empty or mismatched inputs, fewer than two pairs, constant
/// inputs, or an unknown method.
pub fn correlation(x: &[f64], y: &[f64], method: &str) -> MathResult<CorrelationResult> {
    check_pair(x, y)?;
    if !matches!(method, "pearson" | "spearman" | "kendall") {
        return Err(MathError::invalid(
            "method must be one of: ['pearson', 'spearman', 'kendall']",
        ));
    }
    if x.len() < 2 {
        return Err(MathError::invalid("x and y must have length at least 2."));
    }
    let (correlation, pvalue) = match method {
        "pearson" => pearson(x, y)?,
        "spearman" => pearson(&average_ranks(x), &average_ranks(y))?,
        _ => kendall(x, y)?,
    };
    Ok(CorrelationResult {
        correlation,
        pvalue,
        method: method.to_string(),
    })
}

/// Least-squares line through `(x, y)`.
///
/// # Errors
/// Fails on empty or mismatched inputs, fewer than two points, or constant
/// `x`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> MathResult<RegressionResult> {
    check_pair(x, y)?;
    if x.len() < 2 {
        return Err(MathError::invalid("Need at least 2 data points for regression"));
    }
    let n = x.len();
    let (sxx, sxy, syy) = moments(x, y);
    if sxx == 0.0 {
        return Err(MathError::invalid(
            "Cannot calculate a linear regression if all x values are identical",
        ));
    }
    let r_den = (sxx * syy).sqrt();
    let r = if r_den == 0.0 { 0.0 } else { (sxy / r_den).clamp(-1.0, 1.0) };
    let slope = sxy / sxx;
    let intercept = slope.mul_add(-x.iter().mean(), y.iter().mean());
    let pvalue = if n == 2 {
        if y[0] == y[1] { 1.0 } else { 0.0 }
    } else {
        const TINY: f64 = 1.0e-20;
        let df = (n - 2) as f64;
        let t = r * (df / (((1.0 - r) + TINY) * ((1.0 + r) + TINY))).sqrt();
        t_pvalue(t, df, Alternative::TwoSided)?
    };
    let equation = if intercept >= 0.0 {
        format!("y = {slope:.6}*x + {intercept:.6}")
    } else {
        format!("y = {slope:.6}*x - {:.6}", intercept.abs())
    };
    Ok(RegressionResult {
        slope,
        intercept,
        r_squared: r * r,
        pvalue,
        equation,
    })
}

/// Smooths `data` with a trailing window.
///
/// `simple` averages each full window and left-pads with the first average so
/// the output keeps the input length; `exponential` uses
/// `alpha = 2 / (window + 1)`.
///
/// # Errors
/// Fails on empty data, a window outside `1..=len`, or an unknown method.
pub fn moving_average(data: &[f64], window: i64, method: &str) -> MathResult<MovingAverage> {
    if data.is_empty() {
        return Err(MathError::invalid("Data array cannot be empty"));
    }
    if window < 1 {
        return Err(MathError::invalid("window must be at least 1"));
    }
    let Ok(size) = usize::try_from(window) else {
        return Err(MathError::invalid("window is too large"));
    };
    if size > data.len() {
        return Err(MathError::invalid(format!(
            "window ({window}) cannot be larger than data length ({})",
            data.len()
        )));
    }
    let smoothed = match method {
        "simple" => {
            let averages: Vec<f64> = data.windows(size).map(|w| w.iter().sum::<f64>() / size as f64).collect();
            let pad = averages.first().copied().unwrap_or(data[0]);
            let mut out = vec![pad; data.len() - averages.len()];
            out.extend(averages);
            out
        }
        "exponential" => {
            let alpha = 2.0 / (window as f64 + 1.0);
            let mut out = Vec::with_capacity(data.len());
            let mut previous = data[0];
            out.push(previous);
            for value in &data[1..] {
                previous = alpha.mul_add(*value, (1.0 - alpha) * previous);
                out.push(previous);
            }
            out
        }
        other => {
            return Err(MathError::invalid(format!(
                "method must be 'simple' or 'exponential', got '{other}'"
            )));
        }
    };
    Ok(MovingAverage {
        smoothed,
        original: data.to_vec(),
        window,
        method: method.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn describes_a_sample() {
        let d = describe_data(&[120.0, 145.0, 167.0, 123.0, 189.0, 134.0]).expect("describe");
        assert_eq!(d.count, 6);
        assert_eq!(d.min, 120.0);
        assert_eq!(d.max, 189.0);
        assert_eq!(d.range, 69.0);
        assert!(close(d.mean, 146.333_333_333_333_34, 1e-9));
        assert!(close(d.median, 139.5, 1e-12));
        assert!(close(d.percentiles.p50, d.median, 1e-12));
        assert!(close(d.percentiles.p25, 125.75, 1e-12));
        assert!(close(d.variance, 727.866_666_666_666_7, 1e-9));
    }

    #[test]
    fn single_value_has_zero_spread() {
        let d = describe_data(&[42.0]).expect("describe");
        assert_eq!(d.std, 0.0);
        assert_eq!(d.variance, 0.0);
        assert_eq!(d.percentiles.p99, 42.0);
        assert!(describe_data(&[]).is_err());
    }

    #[test]
    fn percentiles_interpolate_linearly() {
        let data: Vec<f64> = (1..=10).map(f64::from).collect();
        let d = describe_data(&data).expect("describe");
        assert!(close(d.percentiles.p50, 5.5, 1e-12));
        assert!(close(d.percentiles.p95, 9.55, 1e-12));
    }

    #[test]
    fn two_sample_ttest_matches_reference() {
        let r = ttest(&[100.0, 102.0, 98.0, 105.0], Some(&[95.0, 97.0, 99.0, 94.0]), "two-sided").expect("ttest");
        assert_eq!(r.test_type, "two-sample");
        assert_eq!(r.degrees_of_freedom, 6);
        assert!(close(r.statistic, 2.688_664_289_689_324_7, 1e-9));
        assert!(close(r.pvalue, 0.036_116_8, 1e-5));
        assert!(r.significant);
        let greater = ttest(&[100.0, 102.0, 98.0, 105.0], Some(&[95.0, 97.0, 99.0, 94.0]), "greater").expect("ttest");
        assert!(close(greater.pvalue * 2.0, r.pvalue, 1e-12));
    }

    #[test]
    fn one_sample_ttest_and_rejections() {
        let r = ttest(&[100.0, 102.0, 98.0, 105.0], None, "two-sided").expect("ttest");
        assert_eq!(r.test_type, "one-sample");
        assert_eq!(r.degrees_of_freedom, 3);
        assert!(r.pvalue < 1e-4);
        assert!(ttest(&[], None, "two-sided").is_err());
        let err = ttest(&[1.0, 2.0, 3.0], Some(&[4.0, 5.0, 6.0]), "invalid").expect_err("alternative");
        assert_eq!(err.to_string(), "alternative must be one of: ['two-sided', 'greater', 'less']");
    }

    #[test]
    fn correlations() {
        let p = correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0], "pearson").expect("pearson");
        assert!(close(p.correlation, 1.0, 1e-12));
        let s = correlation(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5.0, 6.0, 7.0, 8.0, 7.0], "spearman").expect("spearman");
        assert!(close(s.correlation, 0.820_782_681_668_123_7, 1e-9));
        let k = correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0], "kendall").expect("kendall");
        assert!(close(k.correlation, 1.0, 1e-12));
        assert!(close(k.pvalue, 1.0 / 12.0, 1e-12));
        let r = correlation(&[100.0, 200.0, 300.0], &[0.02, 0.05, 0.03], "pearson").expect("pearson");
        assert!((-1.0..=1.0).contains(&r.correlation));
    }

    #[test]
    fn correlation_input_errors() {
        let err = correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0], "pearson").expect_err("length");
        assert!(err.to_string().contains("same length"));
        assert!(correlation(&[], &[], "pearson").is_err());
        assert!(correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], "invalid").is_err());
        assert!(correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], "pearson").is_err());
    }

    #[test]
    fn regression() {
        let r = linear_regression(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).expect("fit");
        assert!(close(r.slope, 2.0, 1e-12));
        assert!(close(r.r_squared, 1.0, 1e-12));
        assert_eq!(r.equation, "y = 2.000000*x + 0.000000");
        let down = linear_regression(&[0.0, 1.0, 2.0], &[-1.0, 0.0, 1.1]).expect("fit");
        assert!(down.equation.contains("*x - "));
        let err = linear_regression(&[1.0], &[2.0]).expect_err("too short");
        assert!(err.to_string().contains("at least 2"));
        assert!(linear_regression(&[1.0, 1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn moving_averages() {
        let m = moving_average(&[10.0, 12.0, 11.0, 15.0, 13.0], 3, "simple").expect("simple");
        assert_eq!(m.smoothed.len(), 5);
        assert!(close(m.smoothed[0], 11.0, 1e-12));
        assert!(close(m.smoothed[1], 11.0, 1e-12));
        assert!(close(m.smoothed[4], 13.0, 1e-12));
        let e = moving_average(&[1.0, 2.0, 3.0], 3, "exponential").expect("ema");
        assert!(close(e.smoothed[1], 1.5, 1e-12));
        assert!(close(e.smoothed[2], 2.25, 1e-12));
        assert!(moving_average(&[1.0], 2, "simple").is_err());
        assert!(moving_average(&[1.0], 0, "simple").is_err());
        assert!(moving_average(&[1.0], 1, "median").is_err());
    }
}
