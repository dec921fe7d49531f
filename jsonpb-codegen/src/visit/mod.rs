//! Tree traversal and struct matching

mod matcher;
mod walk;

pub use matcher::*;
pub use walk::*;
