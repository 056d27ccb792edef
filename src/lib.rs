pub mod curator;
pub mod generator;
pub mod layout;
pub mod mask;
pub mod producer;
pub mod render;
pub mod segment;
pub mod selection;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use curator::{Button, Curator, PointerEvent, Transition};
pub use generator::{InferenceClient, MaskGenerator};
pub use layout::MaskLayout;
pub use mask::Mask;
pub use segment::{GeneratedMask, ManifestEntry, MaskRecord};
pub use selection::SelectionList;
