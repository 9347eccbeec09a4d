pub mod component_resolver;
pub mod coverage;
pub mod proration;
pub mod service;

pub use component_resolver::ComponentIndex;
pub use coverage::RevenueCoverage;
pub use service::{
    allocate_date, allocate_order, allocate_range_fixed, CalendarCostMode, CostBreakdown,
    LineItemIndex, OrderAllocation,
};
