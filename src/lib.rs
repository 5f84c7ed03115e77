#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod core;
pub mod error;
pub mod index;
pub mod list;
pub mod query;
pub mod source;
pub mod stats;
pub mod storage;

pub use crate::core::{FieldValue, Item, Node, Record, Schema};
pub use crate::error::{HierarchyError, Result};
pub use crate::index::Hierarchy;
pub use crate::list::HierarchyList;
