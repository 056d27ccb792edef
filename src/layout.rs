use std::path::{Path, PathBuf};

/// Names every file belonging to one source image under an output root.
#[derive(Debug, Clone)]
pub struct MaskLayout {
    root: PathBuf,
    name: String,
}

impl MaskLayout {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    pub fn raster_path(&self, index: usize) -> PathBuf {
        self.dir().join(format!("{}_mask_{}.npy", self.name, index))
    }

    pub fn preview_path(&self, index: usize) -> PathBuf {
        self.dir().join(format!("{}_mask_{}.png", self.name, index))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir().join(format!("{}_masks.json", self.name))
    }

    pub fn selection_path(&self) -> PathBuf {
        self.dir().join(format!("{}_selected_masks.txt", self.name))
    }
}

/// Extensions tried, in order, when looking up a source image by name.
pub const SOURCE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "tif", "tiff", "bmp"];

/// Finds `image_dir/name.<ext>` for the first extension that exists.
pub fn find_source_image(image_dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| image_dir.join(format!("{}.{}", name, ext)))
        .find(|candidate| candidate.exists())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Image file named {} not found in {:?} (supported formats: {:?})",
                name,
                image_dir,
                SOURCE_EXTENSIONS
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_image_name() {
        let layout = MaskLayout::new("out", "0088");
        assert_eq!(layout.dir(), Path::new("out/0088"));
        assert_eq!(layout.raster_path(3), Path::new("out/0088/0088_mask_3.npy"));
        assert_eq!(layout.preview_path(3), Path::new("out/0088/0088_mask_3.png"));
        assert_eq!(layout.manifest_path(), Path::new("out/0088/0088_masks.json"));
        assert_eq!(
            layout.selection_path(),
            Path::new("out/0088/0088_selected_masks.txt")
        );
    }

    #[test]
    fn source_lookup_prefers_earlier_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"").unwrap();
        let found = find_source_image(dir.path(), "a").unwrap();
        assert_eq!(found, dir.path().join("a.jpg"));
    }

    #[test]
    fn missing_source_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_source_image(dir.path(), "missing").is_err());
    }
}
