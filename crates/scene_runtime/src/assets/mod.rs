//! Asset loading
//!
//! Scene-adjacent data that is not part of the scene description itself.

pub mod attributes;

pub use attributes::{AttributeBuffers, AttributeLoader, B72Loader};
