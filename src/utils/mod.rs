//! Utility modules.

pub mod anchor;
pub mod minify;
