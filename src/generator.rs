use std::io::Cursor;

use anyhow::{ensure, Context, Result};
use image::{ImageFormat, RgbImage};
use reqwest::Client;
use serde_json::from_str;

use crate::{
    mask,
    segment::{GeneratedMask, Segment},
};

pub const ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Anything that turns an RGB image into a set of mask records.
#[allow(async_fn_in_trait)]
pub trait MaskGenerator {
    async fn generate(&self, image: &RgbImage) -> Result<Vec<GeneratedMask>>;
}

/// Segmentation model hosted behind the inference HTTP API.
pub struct InferenceClient {
    client: Client,
    endpoint: String,
    model: String,
    token: String,
}

impl InferenceClient {
    pub fn new(model: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: ENDPOINT.to_owned(),
            model: model.into(),
            token: token.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl MaskGenerator for InferenceClient {
    async fn generate(&self, image: &RgbImage) -> Result<Vec<GeneratedMask>> {
        let payload = {
            let mut buffer = Cursor::new(Vec::new());
            image.write_to(&mut buffer, ImageFormat::Png)?;
            buffer.into_inner()
        };

        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), self.model);
        let res = self
            .client
            .post(&url)
            .body(payload)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?
            .error_for_status()?;

        let text = res.text().await?;
        let segments = from_str::<Vec<Segment>>(&text).context("parsing segments")?;
        log::debug!("{} returned {} segments", self.model, segments.len());

        segments
            .into_iter()
            .map(|segment| to_record(segment, image.dimensions()))
            .collect()
    }
}

fn to_record(segment: Segment, (width, height): (u32, u32)) -> Result<GeneratedMask> {
    let raster = mask::from_png(&segment.mask)
        .with_context(|| format!("decoding mask for segment {:?}", segment.label))?;
    ensure!(
        raster.dim() == (height as usize, width as usize),
        "segment {:?} is {}x{}, image is {}x{}",
        segment.label,
        raster.ncols(),
        raster.nrows(),
        width,
        height
    );

    let area = mask::area(&raster);
    let bbox = mask::bbox(&raster);
    let mut record = GeneratedMask::new(raster)
        .with("label", segment.label)
        .with("area", area)
        .with("bbox", bbox.to_vec());
    if let Some(score) = segment.score {
        record = record.with("predicted_iou", score);
    }

    Ok(record)
}
