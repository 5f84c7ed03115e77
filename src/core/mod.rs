pub mod materialize;
pub mod node;
pub mod record;
pub mod schema;

pub use materialize::*;
pub use node::*;
pub use record::*;
pub use schema::*;
