//! Temporal smoother: short moving average over the raw metric

use std::collections::VecDeque;

/// Fixed-capacity FIFO whose mean is the smoothed metric
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create window holding at most `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a raw sample, evict the oldest if full, return the mean
    pub fn push(&mut self, raw: f64) -> f64 {
        self.values.push_back(raw);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
        self.mean()
    }

    /// Mean of current contents (0 when empty)
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
