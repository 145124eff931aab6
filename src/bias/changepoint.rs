//! Penalized changepoint detection (PELT) with an RBF kernel cost.
//!
//! The kernel bandwidth follows the median heuristic over the whole series:
//! `K(a, b) = exp(-(a - b)^2 / median)`, where `median` is the median of all
//! pairwise squared distances, or 1 when that median is zero. Candidate
//! breakpoints sit on a `jump` grid and every segment holds at least
//! `min_size` points.

use thiserror::Error;

pub const DEFAULT_PENALTY: f64 = 3.0;
pub const DEFAULT_MIN_SIZE: usize = 2;
pub const DEFAULT_JUMP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeltConfig {
    pub penalty: f64,
    pub min_size: usize,
    pub jump: usize,
}

impl Default for PeltConfig {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY,
            min_size: DEFAULT_MIN_SIZE,
            jump: DEFAULT_JUMP,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ChangepointError {
    #[error("series has {len} points but at least {required} are required")]
    TooShort { len: usize, required: usize },
    #[error("series value at index {index} is not finite")]
    NonFinite { index: usize },
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),
    #[error("no admissible segmentation ends at index {end}")]
    NoSegmentation { end: usize },
}

/// Breakpoints of `values`, ascending. The last breakpoint is always
/// `values.len()`; every earlier one is the first index of a new segment.
pub fn detect(values: &[f64], config: &PeltConfig) -> Result<Vec<usize>, ChangepointError> {
    validate_config(config)?;

    let n = values.len();
    if n < config.min_size {
        return Err(ChangepointError::TooShort {
            len: n,
            required: config.min_size,
        });
    }
    if let Some(index) = values.iter().position(|value| !value.is_finite()) {
        return Err(ChangepointError::NonFinite { index });
    }

    let cost = RbfCost::new(values);

    let mut candidates = (0..n)
        .step_by(config.jump)
        .filter(|index| *index >= config.min_size)
        .collect::<Vec<usize>>();
    candidates.push(n);

    let mut best = vec![None::<f64>; n + 1];
    let mut previous = vec![0_usize; n + 1];
    best[0] = Some(0.0);

    let mut admissible = Vec::<usize>::new();
    for &end in &candidates {
        let newest = ((end - config.min_size) / config.jump) * config.jump;
        admissible.push(newest);

        let scored = admissible
            .iter()
            .filter_map(|&start| {
                best[start].map(|base| (start, base + cost.error(start, end) + config.penalty))
            })
            .collect::<Vec<(usize, f64)>>();

        let Some(&(argmin, minimum)) = scored
            .iter()
            .min_by(|left, right| left.1.total_cmp(&right.1))
        else {
            return Err(ChangepointError::NoSegmentation { end });
        };

        best[end] = Some(minimum);
        previous[end] = argmin;

        admissible = scored
            .iter()
            .filter(|(_, value)| *value <= minimum + config.penalty)
            .map(|(start, _)| *start)
            .collect();
    }

    let mut breakpoints = Vec::<usize>::new();
    let mut end = n;
    while end > 0 {
        breakpoints.push(end);
        end = previous[end];
    }
    breakpoints.reverse();

    Ok(breakpoints)
}

fn validate_config(config: &PeltConfig) -> Result<(), ChangepointError> {
    if !config.penalty.is_finite() || config.penalty < 0.0 {
        return Err(ChangepointError::InvalidConfig(format!(
            "penalty must be a finite non-negative number, got {}",
            config.penalty
        )));
    }
    if config.min_size == 0 {
        return Err(ChangepointError::InvalidConfig(
            "min_size must be at least 1".to_string(),
        ));
    }
    if config.jump == 0 {
        return Err(ChangepointError::InvalidConfig(
            "jump must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Segment cost `(e - s) - sum(K[s..e, s..e]) / (e - s)` answered in O(1)
/// from a 2-D prefix sum of the Gram matrix.
struct RbfCost {
    stride: usize,
    prefix: Vec<f64>,
}

impl RbfCost {
    fn new(values: &[f64]) -> Self {
        let n = values.len();
        let scale = median_squared_distance(values);
        let scale = if scale > 0.0 { scale } else { 1.0 };

        let stride = n + 1;
        let mut prefix = vec![0.0_f64; stride * stride];
        for i in 0..n {
            let mut row_total = 0.0_f64;
            for j in 0..n {
                let delta = values[i] - values[j];
                row_total += (-(delta * delta) / scale).exp();
                prefix[(i + 1) * stride + (j + 1)] = prefix[i * stride + (j + 1)] + row_total;
            }
        }

        Self { stride, prefix }
    }

    fn block_sum(&self, start: usize, end: usize) -> f64 {
        let at = |row: usize, col: usize| self.prefix[row * self.stride + col];
        at(end, end) - at(start, end) - at(end, start) + at(start, start)
    }

    fn error(&self, start: usize, end: usize) -> f64 {
        let len = (end - start) as f64;
        len - self.block_sum(start, end) / len
    }
}

fn median_squared_distance(values: &[f64]) -> f64 {
    let mut distances = Vec::<f64>::with_capacity(values.len() * values.len() / 2);
    for (i, left) in values.iter().enumerate() {
        for right in &values[i + 1..] {
            let delta = left - right;
            distances.push(delta * delta);
        }
    }

    if distances.is_empty() {
        return 0.0;
    }

    distances.sort_by(|left, right| left.total_cmp(right));
    let mid = distances.len() / 2;
    if distances.len() % 2 == 0 {
        (distances[mid - 1] + distances[mid]) / 2.0
    } else {
        distances[mid]
    }
}
