use anyhow::{Context, Result};
use clap::Parser;
use rfb_pixelbuffer::ManagedPixelBuffer;
use std::path::Path;
use tracing::info;
use zrle_replay::args::Args;
use zrle_replay::{replay, ReplayConfig};

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("zrle_replay={},rfb_encodings={}", log_level, log_level).into()
            }),
        )
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<ReplayConfig> {
    let mut config = match &args.config {
        Some(path) => ReplayConfig::load(path)?,
        None => ReplayConfig::default(),
    };
    if let Some(fragment_size) = args.fragment_size {
        config.fragment_size = fragment_size;
    }
    config.validate()?;
    Ok(config)
}

fn write_png(path: &Path, framebuffer: ManagedPixelBuffer) -> Result<()> {
    let (width, height) = framebuffer.dimensions();
    let rgba = framebuffer.into_data();
    image::save_buffer_with_format(
        path,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("Failed to write {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("Starting zrle-replay {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    info!(
        "Replaying {} into {}x{} framebuffer, {} bytes per read",
        args.capture.display(),
        args.width,
        args.height,
        config.fragment_size
    );

    let mut file = tokio::fs::File::open(&args.capture)
        .await
        .with_context(|| format!("Failed to open capture {}", args.capture.display()))?;
    let mut framebuffer = ManagedPixelBuffer::new(args.width as u32, args.height as u32);

    let summary = replay(&mut file, &mut framebuffer, &config).await?;
    info!(
        "Inflated {} compressed bytes to {}",
        summary.compressed_bytes, summary.decompressed_bytes
    );

    write_png(&args.output, framebuffer)?;
    info!("Wrote {}", args.output.display());
    Ok(())
}
