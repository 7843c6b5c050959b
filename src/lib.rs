//! An in-memory, read-optimized dictionary over a packed word graph.
//!
//! Words go in through a [`Builder`], which grows a trie, fuses equivalent
//! subtrees bottom-up and packs the survivors into a flat array of 32-bit
//! cells. The resulting [`Dawg`] is immutable and answers membership and
//! rack-constrained subword queries, the latter optionally shaped by an
//! anchored wildcard pattern.

pub mod builder;
pub mod dawg;
pub mod error;
pub mod pattern;
pub mod search;

pub use builder::Builder;
pub use dawg::Dawg;
pub use error::DawgError;
pub use search::Subword;
