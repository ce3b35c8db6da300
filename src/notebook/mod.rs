//! Error notebook: wrong quiz answers kept for spaced review

pub mod models;
mod operations;

pub use models::*;
pub use operations::*;
