pub mod u501_load_datasets;
pub mod u502_rebuild_metrics;
