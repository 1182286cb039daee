pub mod blob;
pub mod job;
pub mod sample;
pub mod serialized;

pub use blob::Blob;
pub use job::JobStatus;
pub use sample::{AudioSample, Manifest, ManifestSample};
pub use serialized::{SerializedHistoryEntry, SerializedSample};
