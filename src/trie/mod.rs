pub mod builder;
pub mod vectorized;

pub use builder::BuilderTrie;
pub use vectorized::{Node, NodeIndex, VectorizedTrie};
