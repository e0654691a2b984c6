pub mod catalog;
pub mod core;
pub mod csv_provider;
pub mod factory;
pub mod massive;
pub mod mock;
pub mod observability;

pub use catalog::get_all_stocks;
pub use csv_provider::CsvDataProvider;
pub use factory::ServiceFactory;
pub use massive::MassiveDataProvider;
pub use mock::SyntheticDataProvider;
