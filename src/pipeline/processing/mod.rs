// Record processing: header normalization, validation and analytics

pub mod analytics;
pub mod date_parser;
pub mod normalize;
pub mod quality_gate;
