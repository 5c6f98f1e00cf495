pub mod engine;
pub mod waypoint;
