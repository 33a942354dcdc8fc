use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text recognition service consumed by the text stage.
///
/// Returning `Err` is a service fault; the caller treats it like empty text.
pub trait TextRecognizer: Send {
    fn recognize(&self, image: &GrayImage) -> anyhow::Result<String>;
}

/// Locations of the two `ocrs` model files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl OcrModelPaths {
    /// Models inside `dir`, using the file names `ocrs-cli` downloads
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join("text-detection.rten"),
            recognition: dir.join("text-recognition.rten"),
        }
    }

    /// Models in the standard cache location (`~/.cache/ocrs`)
    pub fn from_cache() -> anyhow::Result<Self> {
        let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(Self::in_dir(Path::new(&home_dir).join(".cache/ocrs")))
    }
}

/// [`TextRecognizer`] backed by the `ocrs` engine
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    pub fn load(paths: &OcrModelPaths) -> anyhow::Result<Self> {
        if !paths.detection.exists() || !paths.recognition.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                paths.detection.display(),
                paths.recognition.display()
            );
        }

        let detection_model = Model::load_file(&paths.detection)?;
        let recognition_model = Model::load_file(&paths.recognition)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;
        debug!(
            detection = %paths.detection.display(),
            recognition = %paths.recognition.display(),
            "OCR engine initialized"
        );

        Ok(Self { engine })
    }

    pub fn from_cache() -> anyhow::Result<Self> {
        Self::load(&OcrModelPaths::from_cache()?)
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, image: &GrayImage) -> anyhow::Result<String> {
        // The engine takes RGB input
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| anyhow::anyhow!("Failed to wrap image for OCR: {:?}", e))?;
        let input = self.engine.prepare_input(source)?;
        let text = self.engine.get_text(&input)?;
        Ok(text.trim().to_string())
    }
}
