//! Fixed-capacity rolling window

use rust_decimal::{Decimal, MathematicalOps};
use std::collections::VecDeque;

/// Rolling window of the last `capacity` values (oldest first)
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<Decimal>,
    capacity: usize,
    /// Running sum for O(1) mean updates
    sum: Decimal,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            sum: Decimal::ZERO,
        }
    }

    /// Add a value, evicting the oldest when full
    pub fn push(&mut self, value: Decimal) {
        if self.values.len() == self.capacity
            && let Some(removed) = self.values.pop_front()
        {
            self.sum -= removed;
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<Decimal> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.values.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Decimal> {
        self.values.iter().copied().collect()
    }

    pub fn mean(&self) -> Option<Decimal> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.sum / Decimal::from(self.values.len()))
    }

    /// Population standard deviation (ddof=0)
    pub fn std_pop(&self) -> Option<Decimal> {
        let mean = self.mean()?;
        let var = self
            .values
            .iter()
            .map(|v| (*v - mean) * (*v - mean))
            .sum::<Decimal>()
            / Decimal::from(self.values.len());
        var.sqrt()
    }

    pub fn max(&self) -> Option<Decimal> {
        self.values.iter().copied().max()
    }

    pub fn min(&self) -> Option<Decimal> {
        self.values.iter().copied().min()
    }
}
