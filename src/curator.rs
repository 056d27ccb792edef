use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{
    mask::{load_raster, subtract_from, union_into, Mask},
    producer::read_manifest,
    segment::ManifestEntry,
    selection::SelectionList,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
    Other,
}

/// A pointer press in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: usize,
    pub y: usize,
    pub button: Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accepted { index: usize, x: usize, y: usize },
    Rejected { index: usize, x: usize, y: usize },
    Missed { x: usize, y: usize },
    Ignored,
}

/// Selection state for one image: its manifest, the persisted selection
/// list and the cumulative overlay of accepted masks.
pub struct Curator {
    manifest: Vec<ManifestEntry>,
    selection: SelectionList,
    overlay: Mask,
}

impl Curator {
    /// Reads the manifest and replays any existing selection list.
    /// `shape` is `(height, width)` of the source image.
    pub fn open(manifest_path: &Path, selection_path: &Path, shape: (usize, usize)) -> Result<Self> {
        let manifest = read_manifest(manifest_path)?;
        log::info!("{} masks in {:?}", manifest.len(), manifest_path);
        Self::new(manifest, SelectionList::new(selection_path), shape)
    }

    pub fn new(
        manifest: Vec<ManifestEntry>,
        selection: SelectionList,
        shape: (usize, usize),
    ) -> Result<Self> {
        let mut overlay = Mask::from_elem(shape, false);
        let entries = selection.load()?;
        for path in &entries {
            union_into(&mut overlay, &load_raster(path)?)?;
        }
        if !entries.is_empty() {
            log::info!("Replayed {} selected masks", entries.len());
        }

        Ok(Self {
            manifest,
            selection,
            overlay,
        })
    }

    pub fn overlay(&self) -> &Mask {
        &self.overlay
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    /// Currently persisted selection, in file order.
    pub fn selection(&self) -> Result<Vec<PathBuf>> {
        self.selection.load()
    }

    /// First manifest entry, in order, whose raster covers column `x`, row `y`.
    pub fn hit_test(&self, x: usize, y: usize) -> Result<Option<(usize, Mask)>> {
        for (index, entry) in self.manifest.iter().enumerate() {
            let raster = load_raster(&entry.segmentation)?;
            if raster.get((y, x)).copied().unwrap_or(false) {
                return Ok(Some((index, raster)));
            }
            log::debug!("{:?} does not cover ({}, {})", entry.segmentation, x, y);
        }
        Ok(None)
    }

    pub fn accept(&mut self, x: usize, y: usize) -> Result<Transition> {
        let Some((index, raster)) = self.hit_test(x, y)? else {
            log::info!("No mask contains the clicked point.");
            return Ok(Transition::Missed { x, y });
        };

        union_into(&mut self.overlay, &raster)?;
        self.selection.append(&self.manifest[index].segmentation)?;
        log::info!("Accepted mask {} at ({}, {})", index, x, y);

        Ok(Transition::Accepted { index, x, y })
    }

    /// Clears the hit mask's footprint from the overlay, including pixels
    /// other selected masks contributed, and drops it from the selection list.
    pub fn reject(&mut self, x: usize, y: usize) -> Result<Transition> {
        let Some((index, raster)) = self.hit_test(x, y)? else {
            log::info!("No mask contains the clicked point.");
            return Ok(Transition::Missed { x, y });
        };

        subtract_from(&mut self.overlay, &raster)?;
        self.selection.remove(&self.manifest[index].segmentation)?;
        log::info!("Rejected mask {} at ({}, {})", index, x, y);

        Ok(Transition::Rejected { index, x, y })
    }

    pub fn dispatch(&mut self, event: PointerEvent) -> Result<Transition> {
        let PointerEvent { x, y, button } = event;
        log::info!("Clicked at: ({}, {}) with button {:?}", x, y, button);
        match button {
            Button::Primary => self.accept(x, y),
            Button::Secondary => self.reject(x, y),
            Button::Other => Ok(Transition::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mask::save_raster, producer::write_manifest};
    use ndarray::Array2;
    use std::fs;
    use tempfile::TempDir;

    const SHAPE: (usize, usize) = (4, 4);

    /// Writes one raster per pixel list and a manifest naming them.
    fn fixture(masks: &[&[(usize, usize)]]) -> (TempDir, Vec<ManifestEntry>) {
        let dir = tempfile::tempdir().unwrap();
        let entries = masks
            .iter()
            .enumerate()
            .map(|(idx, pixels)| {
                let raster = Array2::from_shape_fn(SHAPE, |p| pixels.contains(&p));
                let path = dir.path().join(format!("m_mask_{}.npy", idx));
                save_raster(&path, &raster).unwrap();
                ManifestEntry::new(path)
            })
            .collect();
        (dir, entries)
    }

    fn curator(dir: &TempDir, entries: &[ManifestEntry]) -> Curator {
        let selection = SelectionList::new(dir.path().join("m_selected_masks.txt"));
        Curator::new(entries.to_vec(), selection, SHAPE).unwrap()
    }

    fn press(x: usize, y: usize, button: Button) -> PointerEvent {
        PointerEvent { x, y, button }
    }

    #[test]
    fn hit_test_prefers_lowest_index() {
        let (dir, entries) = fixture(&[&[(1, 2)], &[(1, 2), (3, 3)]]);
        let curator = curator(&dir, &entries);
        assert_eq!(curator.hit_test(2, 1).unwrap().unwrap().0, 0);
        assert_eq!(curator.hit_test(3, 3).unwrap().unwrap().0, 1);
        assert!(curator.hit_test(0, 0).unwrap().is_none());
    }

    #[test]
    fn hit_test_uses_row_column_order() {
        let (dir, entries) = fixture(&[&[(0, 3)]]);
        let curator = curator(&dir, &entries);
        assert!(curator.hit_test(3, 0).unwrap().is_some());
        assert!(curator.hit_test(0, 3).unwrap().is_none());
    }

    #[test]
    fn out_of_bounds_point_misses() {
        let (dir, entries) = fixture(&[&[(3, 3)]]);
        let mut curator = curator(&dir, &entries);
        assert_eq!(
            curator.dispatch(press(7, 1, Button::Primary)).unwrap(),
            Transition::Missed { x: 7, y: 1 }
        );
    }

    #[test]
    fn accept_merges_and_persists() {
        let (dir, entries) = fixture(&[&[(0, 0), (0, 1)], &[(2, 2)]]);
        let mut curator = curator(&dir, &entries);

        let t = curator.dispatch(press(1, 0, Button::Primary)).unwrap();
        assert_eq!(t, Transition::Accepted { index: 0, x: 1, y: 0 });
        curator.dispatch(press(2, 2, Button::Primary)).unwrap();

        assert_eq!(crate::mask::area(curator.overlay()), 3);
        assert_eq!(
            curator.selection().unwrap(),
            [entries[0].segmentation.clone(), entries[1].segmentation.clone()]
        );
    }

    #[test]
    fn miss_changes_nothing() {
        let (dir, entries) = fixture(&[&[(0, 0)]]);
        let mut curator = curator(&dir, &entries);

        assert_eq!(
            curator.dispatch(press(3, 3, Button::Primary)).unwrap(),
            Transition::Missed { x: 3, y: 3 }
        );
        assert_eq!(
            curator.dispatch(press(3, 3, Button::Secondary)).unwrap(),
            Transition::Missed { x: 3, y: 3 }
        );
        assert_eq!(crate::mask::area(curator.overlay()), 0);
        assert!(!dir.path().join("m_selected_masks.txt").exists());
    }

    #[test]
    fn other_buttons_are_ignored() {
        let (dir, entries) = fixture(&[&[(0, 0)]]);
        let mut curator = curator(&dir, &entries);
        assert_eq!(
            curator.dispatch(press(0, 0, Button::Other)).unwrap(),
            Transition::Ignored
        );
        assert!(curator.selection().unwrap().is_empty());
    }

    #[test]
    fn accept_then_reject_restores_disjoint_overlay() {
        let (dir, entries) = fixture(&[&[(0, 0)], &[(3, 3)]]);
        let mut curator = curator(&dir, &entries);
        curator.dispatch(press(0, 0, Button::Primary)).unwrap();
        let before = curator.overlay().clone();

        curator.dispatch(press(3, 3, Button::Primary)).unwrap();
        let t = curator.dispatch(press(3, 3, Button::Secondary)).unwrap();

        assert_eq!(t, Transition::Rejected { index: 1, x: 3, y: 3 });
        assert_eq!(curator.overlay(), &before);
        assert_eq!(curator.selection().unwrap(), [entries[0].segmentation.clone()]);
    }

    #[test]
    fn rejecting_overlapping_mask_erases_shared_pixels() {
        // mask 1 shares (1, 1) with mask 0
        let (dir, entries) = fixture(&[&[(0, 0), (1, 1)], &[(1, 1), (2, 2)]]);
        let mut curator = curator(&dir, &entries);
        curator.dispatch(press(0, 0, Button::Primary)).unwrap();
        curator.dispatch(press(2, 2, Button::Primary)).unwrap();

        curator.dispatch(press(2, 2, Button::Secondary)).unwrap();

        // mask 0 is still selected but lost its overlapping pixel
        assert_eq!(curator.selection().unwrap(), [entries[0].segmentation.clone()]);
        assert!(curator.overlay()[[0, 0]]);
        assert!(!curator.overlay()[[1, 1]]);
    }

    #[test]
    fn reject_of_unselected_mask_keeps_selection_file() {
        let (dir, entries) = fixture(&[&[(0, 0)], &[(3, 3)]]);
        let mut curator = curator(&dir, &entries);
        curator.dispatch(press(0, 0, Button::Primary)).unwrap();
        let path = dir.path().join("m_selected_masks.txt");
        let before = fs::read(&path).unwrap();

        curator.dispatch(press(3, 3, Button::Secondary)).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn replay_matches_incremental_accepts() {
        let (dir, entries) = fixture(&[&[(0, 0), (1, 1)], &[(1, 1), (2, 3)], &[(3, 0)]]);
        let mut live = curator(&dir, &entries);
        for (x, y) in [(3, 2), (0, 0), (0, 3)] {
            live.dispatch(press(x, y, Button::Primary)).unwrap();
        }

        let replayed = curator(&dir, &entries);
        assert_eq!(replayed.overlay(), live.overlay());
        assert_eq!(
            replayed.overlay().as_slice().unwrap(),
            live.overlay().as_slice().unwrap()
        );
    }

    #[test]
    fn replay_with_missing_raster_fails() {
        let (dir, entries) = fixture(&[&[(0, 0)]]);
        let selection = SelectionList::new(dir.path().join("m_selected_masks.txt"));
        selection.append(&dir.path().join("gone.npy")).unwrap();
        assert!(Curator::new(entries, selection, SHAPE).is_err());
    }
}
