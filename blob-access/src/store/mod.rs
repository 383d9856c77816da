pub mod metadata;
pub mod multipart;
pub mod rocks_store;
pub mod secrets;
pub mod types;

pub use metadata::{BlobMetadata, MemoryBlobStore};
pub use rocks_store::RocksMetadataStore;
pub use secrets::{FileSecretStore, SecretStore};
pub use types::{BlobRecord, BlobStatus, CompletedPart};
