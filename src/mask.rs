use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{ensure, Context, Result};
use image::{Rgba, RgbaImage};
use ndarray::{Array2, Zip};
use ndarray_npy::{read_npy, write_npy};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};

/// Boolean raster indexed `[[row, col]]`, i.e. `[[y, x]]`.
pub type Mask = Array2<bool>;

pub const PREVIEW_ON: Rgba<u8> = Rgba([255, 0, 0, 128]);
pub const PREVIEW_OFF: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub fn save_raster(path: &Path, mask: &Mask) -> Result<()> {
    write_npy(path, mask).with_context(|| format!("writing raster {:?}", path))
}

pub fn load_raster(path: &Path) -> Result<Mask> {
    read_npy(path).with_context(|| format!("reading raster {:?}", path))
}

/// Translucent red where the mask is set, fully transparent elsewhere.
pub fn preview(mask: &Mask) -> RgbaImage {
    let (height, width) = mask.dim();
    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        match mask[[y as usize, x as usize]] {
            true => PREVIEW_ON,
            false => PREVIEW_OFF,
        }
    })
}

pub fn save_preview(path: &Path, mask: &Mask) -> Result<()> {
    let image = preview(mask);
    let file = File::create(path).with_context(|| format!("creating preview {:?}", path))?;

    let mut encoder = Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;

    Ok(())
}

/// Decodes a PNG mask. A pixel is set when any of its samples, alpha
/// included, is non-zero, so palette and alpha-only masks decode too.
pub fn from_png(bytes: &[u8]) -> Result<Mask> {
    let mut decoder = Decoder::new(bytes);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    let samples = info.color_type.samples();
    let (width, height) = (info.width as usize, info.height as usize);
    let stride = info.line_size;
    let bytes = &buf[..info.buffer_size()];

    Ok(Array2::from_shape_fn((height, width), |(row, col)| {
        let start = row * stride + col * samples;
        bytes[start..start + samples].iter().any(|&sample| sample != 0)
    }))
}

pub fn area(mask: &Mask) -> usize {
    mask.iter().filter(|&&set| set).count()
}

/// Tight bounding box as `[x, y, w, h]`; all zeros for an empty mask.
pub fn bbox(mask: &Mask) -> [usize; 4] {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for ((row, col), _) in mask.indexed_iter().filter(|(_, set)| **set) {
        bounds = Some(match bounds {
            None => (col, row, col, row),
            Some((x0, y0, x1, y1)) => (x0.min(col), y0.min(row), x1.max(col), y1.max(row)),
        });
    }

    match bounds {
        Some((x0, y0, x1, y1)) => [x0, y0, x1 - x0 + 1, y1 - y0 + 1],
        None => [0, 0, 0, 0],
    }
}

/// `overlay |= mask`
pub fn union_into(overlay: &mut Mask, mask: &Mask) -> Result<()> {
    ensure!(
        overlay.dim() == mask.dim(),
        "mask shape {:?} does not match overlay shape {:?}",
        mask.dim(),
        overlay.dim()
    );
    Zip::from(overlay).and(mask).for_each(|o, &m| *o |= m);
    Ok(())
}

/// Clears every overlay pixel the mask covers, whoever contributed it.
pub fn subtract_from(overlay: &mut Mask, mask: &Mask) -> Result<()> {
    ensure!(
        overlay.dim() == mask.dim(),
        "mask shape {:?} does not match overlay shape {:?}",
        mask.dim(),
        overlay.dim()
    );
    Zip::from(overlay).and(mask).for_each(|o, &m| *o &= !m);
    Ok(())
}
