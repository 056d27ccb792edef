use std::{
    fs::{self, create_dir_all, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use serde_json::{from_reader, to_writer};

use crate::{
    generator::MaskGenerator,
    layout::MaskLayout,
    mask::{save_preview, save_raster},
    segment::{GeneratedMask, ManifestEntry},
};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Image files directly inside `input`, sorted by path.
pub fn list_images(input: &Path) -> Result<Vec<PathBuf>> {
    let mut images = fs::read_dir(input)
        .with_context(|| format!("reading directory {:?}", input))?
        .map(|entry| Ok(entry?.path()))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
        })
        .collect::<Vec<_>>();
    images.sort();
    Ok(images)
}

/// Writes a raster and a preview per record and returns the records with
/// their segmentation replaced by the raster path.
pub fn save_masks(masks: Vec<GeneratedMask>, layout: &MaskLayout) -> Result<Vec<ManifestEntry>> {
    masks
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let raster_path = layout.raster_path(idx);
            save_raster(&raster_path, &record.segmentation)?;
            save_preview(&layout.preview_path(idx), &record.segmentation)?;
            log::debug!("saved mask {} to {:?}", idx, raster_path);
            Ok(record.with_segmentation(raster_path))
        })
        .collect()
}

pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating manifest {:?}", path))?;
    to_writer(BufWriter::new(file), entries)?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let file = File::open(path).with_context(|| format!("opening manifest {:?}", path))?;
    let entries = from_reader(BufReader::new(file))
        .with_context(|| format!("parsing manifest {:?}", path))?;
    Ok(entries)
}

/// Segments one image and writes its outputs under `output/<stem>/`.
/// Returns the manifest path.
pub async fn process_image<G: MaskGenerator>(
    generator: &G,
    image_path: &Path,
    output: &Path,
) -> Result<PathBuf> {
    let start = Instant::now();
    let image_name = image_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("invalid image file name {:?}", image_path))?;
    log::info!("Processing image {:?}...", image_path);

    let layout = MaskLayout::new(output, image_name);
    create_dir_all(layout.dir()).with_context(|| format!("creating {:?}", layout.dir()))?;

    let image = image::open(image_path)
        .with_context(|| format!("opening image {:?}", image_path))?
        .into_rgb8();
    let masks = generator.generate(&image).await?;
    log::debug!("{} masks for {:?}", masks.len(), image_path);

    let entries = save_masks(masks, &layout)?;
    let manifest_path = layout.manifest_path();
    write_manifest(&manifest_path, &entries)?;

    log::info!(
        "Image {:?} processed. Masks saved to {:?}",
        image_path,
        manifest_path
    );
    log::info!("Elapsed time: {:.2} seconds", start.elapsed().as_secs_f64());

    Ok(manifest_path)
}

/// Processes every image in `input` in order; the first failure aborts.
pub async fn process_folder<G: MaskGenerator>(
    generator: &G,
    input: &Path,
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let images = list_images(input)?;
    log::info!("Found {} image files in {:?}", images.len(), input);

    let mut manifests = Vec::with_capacity(images.len());
    for image_path in images {
        manifests.push(process_image(generator, &image_path, output).await?);
    }

    Ok(manifests)
}
