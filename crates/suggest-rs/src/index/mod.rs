pub mod builder;
mod error;
pub mod in_memory;

pub use builder::SuggestIndexBuilder;
pub use error::BuildError;
pub use in_memory::{IndexedItem, PrefixEntry, SuggestIndex};
