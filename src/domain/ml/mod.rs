pub mod confidence;
pub mod scaler;
pub mod sliding_window;
pub mod windowing;

pub use confidence::{ConfidenceAssessment, assess};
pub use scaler::MinMaxScaler;
pub use sliding_window::SlidingWindow;
pub use windowing::{WINDOW_LENGTH, Window, build_windows};
