pub mod cost_allocation;
