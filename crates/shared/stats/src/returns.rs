//! Return series, historical VaR and correlation

use crate::rolling::RollingWindow;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use std::cmp::Ordering;
use std::collections::VecDeque;

/// The two bar timestamps a return was measured between
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReturnSpan {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Simple bar-over-bar returns of a close series, each tagged with the
/// span it covers
#[derive(Debug, Clone)]
pub struct ReturnSeries {
    returns: RollingWindow,
    spans: VecDeque<ReturnSpan>,
    prev: Option<(DateTime<Utc>, Decimal)>,
}

impl ReturnSeries {
    pub fn new(capacity: usize) -> Self {
        let returns = RollingWindow::new(capacity);
        Self {
            spans: VecDeque::with_capacity(returns.capacity()),
            returns,
            prev: None,
        }
    }

    /// Feed a close; records (close - prev) / prev when prev is positive
    /// and the quotient fits a `Decimal`
    pub fn update(&mut self, close: Decimal, at: DateTime<Utc>) -> Option<Decimal> {
        let (from, prev) = self.prev.replace((at, close))?;
        if prev <= Decimal::ZERO {
            return None;
        }
        let ret = close.checked_sub(prev)?.checked_div(prev)?;
        if self.spans.len() == self.returns.capacity() {
            self.spans.pop_front();
        }
        self.spans.push_back(ReturnSpan { from, to: at });
        self.returns.push(ret);
        Some(ret)
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn values(&self) -> Vec<Decimal> {
        self.returns.to_vec()
    }

    /// Returns paired with their spans, oldest first
    pub fn stamped(&self) -> Vec<(ReturnSpan, Decimal)> {
        self.spans.iter().copied().zip(self.returns.iter()).collect()
    }

    /// Population std dev of the stored returns
    pub fn volatility(&self) -> Option<Decimal> {
        self.returns.std_pop()
    }

    /// Historical VaR at `confidence` (e.g. 0.95) as a return
    pub fn var(&self, confidence: Decimal) -> Option<Decimal> {
        historical_var(&self.values(), confidence)
    }
}

/// Historical Value-at-Risk using the nearest-rank percentile.
///
/// Returns the `(1 - confidence)` quantile of `returns`, so a 95% VaR of
/// `-0.04` means one bar in twenty loses 4% or more. `None` when empty.
pub fn historical_var(returns: &[Decimal], confidence: Decimal) -> Option<Decimal> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort();

    let tail = (Decimal::ONE - confidence).max(Decimal::ZERO);
    let rank = (tail * Decimal::from(sorted.len())).ceil();
    let rank = rank.to_usize().unwrap_or(0).clamp(1, sorted.len());
    sorted.get(rank - 1).copied()
}

/// Pearson correlation of the most recent overlapping samples.
///
/// Aligns the two slices on their tails. `None` with fewer than two
/// overlapping samples, zero variance on either side, or sums too large
/// for a `Decimal`.
pub fn pearson_correlation(a: &[Decimal], b: &[Decimal]) -> Option<Decimal> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];
    let count = Decimal::from(n);

    let mean_a = checked_sum(a)?.checked_div(count)?;
    let mean_b = checked_sum(b)?.checked_div(count)?;

    let mut cov = Decimal::ZERO;
    let mut var_a = Decimal::ZERO;
    let mut var_b = Decimal::ZERO;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x.checked_sub(mean_a)?;
        let dy = y.checked_sub(mean_b)?;
        cov = cov.checked_add(dx.checked_mul(dy)?)?;
        var_a = var_a.checked_add(dx.checked_mul(dx)?)?;
        var_b = var_b.checked_add(dy.checked_mul(dy)?)?;
    }

    if var_a.is_zero() || var_b.is_zero() {
        return None;
    }
    let denom = var_a.checked_mul(var_b)?.sqrt()?;
    if denom.is_zero() {
        return None;
    }
    Some(cov.checked_div(denom)?.clamp(Decimal::NEGATIVE_ONE, Decimal::ONE))
}

/// Pearson correlation over the returns both series measured across the
/// same pair of bars.
///
/// Inputs are ordered oldest first, as [`ReturnSeries::stamped`] yields
/// them. A return that spans a bar the other series saw drops out of the
/// pairing instead of shifting every later sample. `None` with fewer than
/// `min_samples` matched pairs.
pub fn aligned_correlation(
    a: &[(ReturnSpan, Decimal)],
    b: &[(ReturnSpan, Decimal)],
    min_samples: usize,
) -> Option<Decimal> {
    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (0, 0);
    while let (Some((ta, ra)), Some((tb, rb))) = (a.get(i), b.get(j)) {
        match ta.cmp(tb) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                xs.push(*ra);
                ys.push(*rb);
                i += 1;
                j += 1;
            }
        }
    }
    if xs.len() < min_samples.max(2) {
        return None;
    }
    pearson_correlation(&xs, &ys)
}

fn checked_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}
