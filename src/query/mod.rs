pub mod engine;
pub mod filter;

pub use filter::*;
