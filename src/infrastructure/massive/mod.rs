pub mod common;
pub mod market_data;

pub use common::{AggregateBar, AggregatesResponse, parse_aggregates};
pub use market_data::{MassiveDataProvider, MassiveDataProviderBuilder};
