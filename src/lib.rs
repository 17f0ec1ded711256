pub mod asset_pipeline;
pub mod config;
pub mod error;
pub mod host;
pub mod math;
pub mod model;
pub mod pipeline;
pub mod scene_graph;
pub mod sync;
