use crate::domain::errors::ForecastError;

/// Number of consecutive days fed to the model as context.
pub const WINDOW_LENGTH: usize = 30;

/// A supervised sample: `WINDOW_LENGTH` scaled closes and the scaled close that follows.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub inputs: Vec<f64>,
    pub target: f64,
}

/// Slides a window of `length` over `values`, yielding `values.len() - length`
/// samples in temporal order.
pub fn build_windows(values: &[f64], length: usize) -> Result<Vec<Window>, ForecastError> {
    if values.len() < length + 1 {
        return Err(ForecastError::InsufficientHistory {
            available: values.len(),
            required: length + 1,
        });
    }

    Ok(values
        .windows(length + 1)
        .map(|w| Window {
            inputs: w[..length].to_vec(),
            target: w[length],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_short_series_fails() {
        for n in [0, 1, 15, 30] {
            let result = build_windows(&ramp(n), WINDOW_LENGTH);
            assert_eq!(
                result,
                Err(ForecastError::InsufficientHistory {
                    available: n,
                    required: 31
                })
            );
        }
    }

    #[test]
    fn test_minimum_series_yields_one_window() {
        let windows = build_windows(&ramp(31), WINDOW_LENGTH).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].inputs.len(), 30);
        assert_eq!(windows[0].target, 30.0);
    }

    #[test]
    fn test_windows_preserve_order() {
        let windows = build_windows(&ramp(100), WINDOW_LENGTH).unwrap();
        assert_eq!(windows.len(), 70);

        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.inputs.first().copied(), Some(i as f64));
            assert_eq!(w.inputs.last().copied(), Some((i + 29) as f64));
            assert_eq!(w.target, (i + 30) as f64);
        }
    }
}
