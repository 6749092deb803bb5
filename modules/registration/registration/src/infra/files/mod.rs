pub mod artifact_cache;
pub mod photo_store;

pub use artifact_cache::DirectoryArtifactCache;
pub use photo_store::LocalPhotoStore;
