pub mod naming;
pub mod store;

pub use naming::ArtifactIds;
pub use store::{ArtifactKind, ArtifactStore, FsArtifactStore};
