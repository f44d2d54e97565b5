pub mod artifacts;
pub mod json;
