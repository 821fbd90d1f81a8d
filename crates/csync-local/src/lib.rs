pub mod local;

pub use local::engine::{LocalEngine, LocalSession};
pub use local::copy::copy_local_tree;
