//! Utility modules shared by the build, watch and serve paths.

pub mod category;
pub mod minify;
pub mod path;
