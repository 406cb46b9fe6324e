//! Source staging module
//!
//! Stages the meta tree consumed by the packaging step and prepares the
//! build directory the extension compiler reads sources from.

mod tree;

pub use tree::*;
