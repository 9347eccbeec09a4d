pub mod executor;

pub use executor::RebuildExecutor;
