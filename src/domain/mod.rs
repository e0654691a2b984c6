// Domain-specific error types
pub mod errors;

// Scaling, windowing and confidence heuristics
pub mod ml;

// Port interfaces
pub mod ports;

// Price history and prediction value types
pub mod types;
