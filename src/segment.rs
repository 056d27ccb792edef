use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{
    base64::{Base64, Standard},
    formats::Unpadded,
    serde_as,
};

use crate::mask::Mask;

/// One segment as returned by the hosted inference API.
#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Segment {
    #[serde(default)]
    pub score: Option<f32>,
    pub label: String,
    /// PNG-encoded grayscale mask.
    #[serde_as(as = "Base64<Standard, Unpadded>")]
    pub mask: Vec<u8>,
}

/// A mask plus whatever scalar metadata the generator attached to it.
///
/// `segmentation` is the raster itself while the record is in memory and the
/// raster's file path once it has been written to a manifest. Metadata keys
/// are flattened next to it, so a manifest entry reads
/// `{"segmentation": "...npy", "area": 12, "bbox": [..], ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MaskRecord<S> {
    pub segmentation: S,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

pub type GeneratedMask = MaskRecord<Mask>;
pub type ManifestEntry = MaskRecord<PathBuf>;

impl<S> MaskRecord<S> {
    pub fn new(segmentation: S) -> Self {
        Self {
            segmentation,
            metadata: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    /// Swaps the segmentation payload, keeping metadata untouched.
    pub fn with_segmentation<T>(self, segmentation: T) -> MaskRecord<T> {
        MaskRecord {
            segmentation,
            metadata: self.metadata,
        }
    }
}
