pub mod d400_range_analytics;
