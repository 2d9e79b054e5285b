//! Descriptive statistics and correlation tests over indicator columns.

use std::cmp::Ordering;

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (xs.len() - 1) as f64).sqrt())
}

fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut s = xs.to_vec();
    s.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    s
}

fn quantile_sorted(s: &[f64], q: f64) -> Option<f64> {
    if s.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (s.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(s[lo] + (s[hi] - s[lo]) * (pos - lo as f64))
}

/// The q-quantile, interpolating linearly between the closest ranks.
pub fn quantile(xs: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(xs), q)
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Undefined with a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn describe(xs: &[f64]) -> Option<Describe> {
    let s = sorted(xs);
    Some(Describe {
        count: s.len(),
        mean: mean(&s)?,
        std: std_dev(&s),
        min: *s.first()?,
        q25: quantile_sorted(&s, 0.25)?,
        median: quantile_sorted(&s, 0.5)?,
        q75: quantile_sorted(&s, 0.75)?,
        max: *s.last()?,
    })
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Correlation {
    pub coefficient: f64,
    /// Two-sided, against the null hypothesis of no correlation.
    pub p_value: f64,
    pub count: usize,
}

/// Pearson correlation. Undefined below 3 pairs or when a column is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<Correlation> {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return None;
    }
    let mx = mean(&xs[..n])?;
    let my = mean(&ys[..n])?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    let den = (sxx * syy).sqrt();
    if den <= 1e-12 {
        return None;
    }
    let r = (sxy / den).clamp(-1.0, 1.0);
    Some(Correlation {
        coefficient: r,
        p_value: correlation_p_value(r, n),
        count: n,
    })
}

/// Ranks starting at 1. Ties get the average of the ranks they span.
pub fn ranks(xs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|a, b| xs[*a].partial_cmp(&xs[*b]).unwrap_or(Ordering::Equal));
    let mut res = vec![0.0; xs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && xs[order[j + 1]] == xs[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for idx in order[i..=j].iter() {
            res[*idx] = rank;
        }
        i = j + 1;
    }
    res
}

/// Spearman rank correlation: the Pearson correlation of the ranks.
pub fn spearman(xs: &[f64], ys: &[f64]) -> Option<Correlation> {
    let n = xs.len().min(ys.len());
    pearson(&ranks(&xs[..n]), &ranks(&ys[..n]))
}

/// Student t test of a correlation coefficient, with n - 2 degrees of freedom.
fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return f64::NAN;
    }
    let df = (n - 2) as f64;
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let t2 = r * r * df / (1.0 - r * r);
    // P(|T| > t) = I_{df / (df + t^2)}(df / 2, 1 / 2)
    regularized_incomplete_beta(df / (df + t2), df / 2.0, 0.5).clamp(0.0, 1.0)
}

fn ln_gamma(x: f64) -> f64 {
    // Lanczos approximation, g = 7.
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = COEFFS[0];
    let t = x + 7.5;
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The continued fraction converges fast below the mean of the distribution.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Modified Lentz evaluation.
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const TINY: f64 = 1e-300;
    const EPS: f64 = 1e-14;
    let mut c = 1.0;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..300 {
        let m = m as f64;
        let m2 = 2.0 * m;
        // Even step.
        let num = m * (b - m) * x / ((a + m2 - 1.0) * (a + m2));
        d = 1.0 + num * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + num / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;
        // Odd step.
        let num = -(a + m) * (a + b + m) * x / ((a + m2) * (a + m2 + 1.0));
        d = 1.0 + num * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + num / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn basic_moments() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(close(sd, 2.138089935299395));
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn quantiles() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.75), Some(3.25));
        assert_eq!(quantile(&[5.0, 1.0, 3.0], 0.25), Some(2.0));
        assert_eq!(quantile(&[5.0], 0.75), Some(5.0));
        assert_eq!(quantile(&[], 0.5), None);
        let d = describe(&[4.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(d.count, 4);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.median, 2.5);
        assert_eq!(d.max, 4.0);
    }

    #[test]
    fn average_ranks() {
        assert_eq!(ranks(&[3.0, 1.0, 3.0, 2.0]), vec![3.5, 1.0, 3.5, 2.0]);
    }

    #[test]
    fn pearson_with_p_value() {
        let c = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!(close(c.coefficient, 0.7745966692414834));
        assert!((c.p_value - 0.12402706).abs() < 1e-5);

        let c = pearson(
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            &[9.0, 7.0, 8.0, 4.0, 3.0, 1.0],
        )
        .unwrap();
        assert!(close(c.coefficient, -0.952947064693579));
        assert!((c.p_value - 0.00326888).abs() < 1e-5);
    }

    #[test]
    fn too_few_points() {
        assert_eq!(pearson(&[1.0, 2.0], &[3.0, 5.0]), None);
        assert_eq!(spearman(&[1.0], &[3.0]), None);
        assert!(correlation_p_value(0.5, 2).is_nan());
        assert!(correlation_p_value(0.5, 0).is_nan());
    }

    #[test]
    fn spearman_with_ties() {
        let c = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!(close(c.coefficient, 0.7378647873726218));
        assert!((c.p_value - 0.15461852).abs() < 1e-5);
    }

    #[test]
    fn undefined_correlations() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0, 2.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        let c = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(c.p_value, 0.0);
    }
}
