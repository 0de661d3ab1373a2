use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Snap `target` to the closest member of `options`.
///
/// Ties resolve to the candidate that appears first. Returns `None` only when
/// `options` is empty; [`ValueSet`] guarantees that never happens.
pub fn discretize(target: f64, options: &[f64]) -> Option<f64> {
    let mut iter = options.iter().copied();
    let mut best = iter.next()?;
    let mut best_dist = (best - target).abs();
    for candidate in iter {
        let dist = (candidate - target).abs();
        if dist < best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    Some(best)
}

/// The values an instrument actually reports for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueSet {
    values: Vec<f64>,
}

impl ValueSet {
    pub fn new(values: Vec<f64>) -> Result<Self, CoreError> {
        if values.is_empty() {
            return Err(CoreError::EmptyValueSet);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::NonFiniteValue);
        }
        for pair in values.windows(2) {
            if pair[1] <= pair[0] {
                return Err(CoreError::UnorderedValueSet {
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self { values })
    }

    /// Evenly spaced set `start, start + step, ..., end` (inclusive).
    pub fn stepped(start: f64, end: f64, step: f64) -> Result<Self, CoreError> {
        if step.is_nan() || step <= 0.0 || !start.is_finite() || !end.is_finite() {
            return Err(CoreError::NonFiniteValue);
        }
        let count = ((end - start) / step).round() as i64;
        let values = (0..=count.max(0)).map(|i| start + step * i as f64).collect();
        Self::new(values)
    }

    /// Sorted, de-duplicated union of two sets.
    pub fn union(&self, other: &ValueSet) -> ValueSet {
        let mut values: Vec<f64> = self.values.iter().chain(&other.values).copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        ValueSet { values }
    }

    pub fn nearest(&self, target: f64) -> f64 {
        discretize(target, &self.values).unwrap_or(self.values[0])
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn contains(&self, value: f64) -> bool {
        self.values.iter().any(|v| *v == value)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl<'de> Deserialize<'de> for ValueSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        ValueSet::new(values).map_err(serde::de::Error::custom)
    }
}
