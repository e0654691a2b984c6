use std::collections::VecDeque;

/// Fixed-capacity queue of the most recent scaled values.
///
/// Pushing onto a full window evicts the oldest value in O(1), so the
/// autoregressive loop never reallocates.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Seeds the window with the trailing `capacity` values of `history`.
    pub fn from_history(capacity: usize, history: &[f64]) -> Self {
        let mut window = Self::new(capacity);
        let start = history.len().saturating_sub(capacity);
        for &value in &history[start..] {
            window.push(value);
        }
        window
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-to-newest view of the window.
    pub fn as_slice(&mut self) -> &[f64] {
        self.values.make_contiguous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_when_full() {
        let mut window = SlidingWindow::new(3);
        for v in [1.0, 2.0, 3.0] {
            window.push(v);
        }
        assert!(window.is_full());

        window.push(4.0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.as_slice(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_history_keeps_trailing_values() {
        let history: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut window = SlidingWindow::from_history(4, &history);

        assert_eq!(window.capacity(), 4);
        assert_eq!(window.as_slice(), &[6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_short_history_is_not_full() {
        let window = SlidingWindow::from_history(5, &[1.0, 2.0]);
        assert_eq!(window.len(), 2);
        assert!(!window.is_full());
        assert!(!window.is_empty());
    }

    #[test]
    fn test_length_stays_at_capacity_over_many_pushes() {
        let mut window = SlidingWindow::from_history(30, &[0.5; 30]);
        for i in 0..100 {
            window.push(i as f64);
            assert_eq!(window.len(), 30);
        }
        assert_eq!(window.as_slice()[0], 70.0);
    }
}
