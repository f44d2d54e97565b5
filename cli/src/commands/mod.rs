pub mod batch;
pub mod diff;
pub mod extract;
pub mod format;
