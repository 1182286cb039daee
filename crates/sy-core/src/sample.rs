use serde::{Deserialize, Serialize};

/// One generated audio artifact, unpacked from a result archive.
///
/// `filename` is unique within a single job's result set; the binary payload
/// is owned by the sample once assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSample {
    pub filename: String,
    pub description: String,
    pub data: Vec<u8>,
}

/// The `metadata.json` index inside a result archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub samples: Vec<ManifestSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSample {
    pub filename: String,
    pub description: String,
}
