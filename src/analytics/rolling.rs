use std::collections::VecDeque;

/// Trailing simple moving average over a fixed window of observations.
/// Yields `None` until the window fills — early positions stay undefined and
/// are never backfilled.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            values: VecDeque::with_capacity(window.max(1)),
            sum: 0.0,
        }
    }

    /// Push an observation and return the window mean once available.
    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(expired) = self.values.pop_front() {
                self.sum -= expired;
            }
        }
        if self.values.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.values.len() == self.window
    }
}
