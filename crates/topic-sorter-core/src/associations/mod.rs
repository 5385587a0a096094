pub mod enrich;
pub mod guidebook;
pub mod store;
pub mod tree;

pub use enrich::{generate_associations, EnrichOptions, FolderNameTerms, NoSynonyms, SynonymSource};
pub use guidebook::Guidebook;
pub use store::{deep_merge, load, save, try_load};
pub use tree::{AssociationEntry, AssociationTree};
