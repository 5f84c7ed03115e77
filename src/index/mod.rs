pub mod builder;
pub mod hierarchy;

pub use builder::{build_indices, Indices, PositionIndex};
pub use hierarchy::Hierarchy;
