use std::{fs::create_dir_all, path::PathBuf};

use anyhow::{ensure, Result};
use clap::Parser;
use maskcurate::{generator::ENDPOINT, producer::process_folder, InferenceClient};

/// Generate masks for every image in a folder.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of .jpg/.jpeg/.png/.bmp images.
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving one subfolder per image.
    #[arg(short, long)]
    output: PathBuf,

    /// Segmentation model served by the inference API.
    #[arg(short, long)]
    model: String,

    #[arg(short, long)]
    token: String,

    #[arg(long, default_value = ENDPOINT)]
    endpoint: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(args.input.is_dir(), "{:?} is not a directory", args.input);
    if !args.output.exists() {
        create_dir_all(&args.output)?;
    }

    let client = InferenceClient::new(args.model, args.token).with_endpoint(args.endpoint);
    let manifests = process_folder(&client, &args.input, &args.output).await?;
    log::info!("Wrote {} manifests", manifests.len());

    Ok(())
}
