use clap::{Parser, ValueEnum};
use image::ImageReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use framescan::detection::OcrModelPaths;
use framescan::{
    CodeFormat, CropRegion, DecodeMessage, DecodePipeline, Frame, FrameDecoder, MultiFormatReader,
    OcrsRecognizer, RecognitionHints,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Code39,
    Code128,
    Qr,
}

impl From<FormatArg> for CodeFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Code39 => CodeFormat::Code39,
            FormatArg::Code128 => CodeFormat::Code128,
            FormatArg::Qr => CodeFormat::QrCode,
        }
    }
}

#[derive(Parser)]
#[command(name = "framescan")]
#[command(about = "Read phone numbers or barcodes from a camera preview frame")]
struct Cli {
    /// Image whose luma plane is used as the raw preview frame
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Crop region in rotated-frame coordinates: LEFT,TOP,WIDTH,HEIGHT
    #[arg(long, value_name = "L,T,W,H", value_parser = parse_crop)]
    crop: Option<CropRegion>,

    /// Accepted barcode formats
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [FormatArg::Code39, FormatArg::Code128, FormatArg::Qr])]
    formats: Vec<FormatArg>,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Skip phone number recognition (no OCR models needed)
    #[arg(long)]
    skip_ocr: bool,

    /// Save the recognized image to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_crop(value: &str) -> Result<CropRegion, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop value: {}", e))?;
    match parts.as_slice() {
        [left, top, width, height] => Ok(CropRegion::new(*left, *top, *width, *height)),
        _ => Err("crop must have four values: LEFT,TOP,WIDTH,HEIGHT".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();

    if args.verbose {
        println!("Frame loaded: {}x{}", width, height);
    }

    // The frame is rotated before cropping, so the full region swaps dimensions
    let crop = args.crop.unwrap_or(CropRegion::new(0, 0, height, width));
    let hints = RecognitionHints::new(args.formats.iter().copied().map(CodeFormat::from));

    let mut decoder = FrameDecoder::new(
        Box::new(move || Some(crop)),
        Box::new(MultiFormatReader::new()),
    )
    .with_hints(hints);

    if !args.skip_ocr {
        let recognizer = match &args.models {
            Some(dir) => OcrsRecognizer::load(&OcrModelPaths::in_dir(dir))?,
            None => OcrsRecognizer::from_cache()?,
        };
        decoder = decoder.with_text_recognizer(Box::new(recognizer));
    }

    if let Some(debug_dir) = args.debug_out {
        decoder = decoder.with_debug(debug_dir)?;
    }

    let (pipeline, mut outcomes) = DecodePipeline::spawn(decoder)?;
    pipeline.submit(Frame::new(luma.into_raw(), width, height))?;
    pipeline.shutdown()?;

    while let Some(message) = outcomes.blocking_recv() {
        match message {
            DecodeMessage::Succeeded { kind, text, image } => {
                println!("{}: {}", kind.tag(), text);
                if args.verbose {
                    println!("  recognized from {}x{} region", image.width(), image.height());
                }
            }
            DecodeMessage::Failed => println!("No phone number or barcode found."),
        }
    }

    Ok(())
}
