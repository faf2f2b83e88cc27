//! Scene-level integration tests: parse, build and run frames together

mod fixtures;
mod scene_properties;
