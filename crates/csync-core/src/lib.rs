//! # clubsync – core
//!
//! Backend-independent building blocks shared by every file engine:
//!   • `error`: the categorised `FsError` every engine reports through
//!   • `types`: engine kinds, engine descriptors, tree entries
//!   • `engine`: the `FileEngine` / `Session` capability traits
//!   • `tree`: lazy tree walking and callback-walk reconstruction
//!   • `path`: POSIX-style remote path helpers

pub mod engine;
pub mod error;
pub mod path;
pub mod tree;
pub mod types;

pub use engine::{copy_tree, ensure_local_dir, CopyStats, FileEngine, Session};
pub use error::{FsError, FsErrorKind, FsResult};
pub use tree::{rebuild_tree, DirListing, TreeWalk};
pub use types::{EngineDescriptor, EngineKind, TreeEntry};
