pub mod service;

pub use service::RangeAnalyticsService;
