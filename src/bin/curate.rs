use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image::Rgb;
use maskcurate::{
    layout::find_source_image,
    render::DEFAULT_ALPHA,
    viewer::{self, Style},
    Curator, MaskLayout,
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MarkerColor {
    Green,
    Red,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    White,
}

impl MarkerColor {
    fn rgb(self) -> Rgb<u8> {
        match self {
            MarkerColor::Green => Rgb([0, 128, 0]),
            MarkerColor::Red => Rgb([255, 0, 0]),
            MarkerColor::Blue => Rgb([0, 0, 255]),
            MarkerColor::Yellow => Rgb([255, 255, 0]),
            MarkerColor::Cyan => Rgb([0, 255, 255]),
            MarkerColor::Magenta => Rgb([255, 0, 255]),
            MarkerColor::White => Rgb([255, 255, 255]),
        }
    }
}

/// Accept (left click) or reject (right click) the masks of one image.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the source image.
    #[arg(short, long)]
    images: PathBuf,

    /// Directory the masks were produced into.
    #[arg(short, long)]
    output: PathBuf,

    /// Image name without extension.
    #[arg(short, long)]
    name: String,

    #[arg(long, value_enum, default_value_t = MarkerColor::Green)]
    accept_color: MarkerColor,

    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let image_path = find_source_image(&args.images, &args.name)?;
    let image = image::open(&image_path)
        .with_context(|| format!("opening image {:?}", image_path))?
        .into_rgb8();
    let (width, height) = image.dimensions();

    let layout = MaskLayout::new(&args.output, args.name.as_str());
    let curator = Curator::open(
        &layout.manifest_path(),
        &layout.selection_path(),
        (height as usize, width as usize),
    )?;

    viewer::run(
        curator,
        image,
        Style {
            accept_color: args.accept_color.rgb(),
            alpha: args.alpha,
        },
    )
}
