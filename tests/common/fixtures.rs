use framescan::detection::{BinaryBitmap, CodeReader, DecodedCode, TextRecognizer};
use framescan::{CodeFormat, CropRegion, Frame, RecognitionHints};
use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};
use std::sync::{Arc, Mutex};

/// Calls made to the fake services, in order
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().expect("log lock").clone()
}

/// OCR fake returning the same text for every image.
/// `None` simulates an engine failure.
pub struct FakeOcr {
    pub text: Option<String>,
    pub log: CallLog,
}

impl TextRecognizer for FakeOcr {
    fn recognize(&self, image: &GrayImage) -> anyhow::Result<String> {
        self.log
            .lock()
            .expect("log lock")
            .push(format!("ocr {}x{}", image.width(), image.height()));
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("OCR engine crashed"),
        }
    }
}

/// OCR fake whose engine panics on every image
pub struct PanickingOcr {
    pub log: CallLog,
}

impl TextRecognizer for PanickingOcr {
    fn recognize(&self, image: &GrayImage) -> anyhow::Result<String> {
        self.log
            .lock()
            .expect("log lock")
            .push(format!("ocr {}x{}", image.width(), image.height()));
        panic!("OCR model input shape mismatch")
    }
}

/// What the fake reader does on one attempt
#[derive(Clone, Debug)]
pub enum ReaderStep {
    Decode(&'static str),
    Miss,
    Fail,
}

/// Code reader fake that plays back a script and records calls.
///
/// It also tracks whether it was reset since the last attempt; a decode on a
/// dirty reader is recorded as `decode(dirty)`.
pub struct FakeReader {
    pub script: Vec<ReaderStep>,
    pub log: CallLog,
    dirty: bool,
}

impl FakeReader {
    pub fn new(script: Vec<ReaderStep>, log: CallLog) -> Self {
        Self {
            script,
            log,
            dirty: false,
        }
    }
}

impl CodeReader for FakeReader {
    fn decode(
        &mut self,
        _bitmap: &BinaryBitmap,
        _hints: &RecognitionHints,
    ) -> anyhow::Result<Option<DecodedCode>> {
        let entry = if self.dirty { "decode(dirty)" } else { "decode" };
        self.log.lock().expect("log lock").push(entry.to_string());
        self.dirty = true;

        let step = if self.script.is_empty() {
            ReaderStep::Miss
        } else {
            self.script.remove(0)
        };
        match step {
            ReaderStep::Decode(payload) => Ok(Some(DecodedCode {
                payload: payload.to_string(),
                format: CodeFormat::QrCode,
            })),
            ReaderStep::Miss => Ok(None),
            ReaderStep::Fail => anyhow::bail!("reader blew up"),
        }
    }

    fn reset(&mut self) {
        self.dirty = false;
        self.log.lock().expect("log lock").push("reset".to_string());
    }
}

/// Frame of the given size filled with a gradient
pub fn gradient_frame(width: u32, height: u32) -> Frame {
    let data = (0..width * height).map(|i| (i % 251) as u8).collect();
    Frame::new(data, width, height)
}

/// Crop covering the whole rotated frame of a `width` x `height` source
pub fn full_rotated_crop(width: u32, height: u32) -> CropRegion {
    CropRegion::new(0, 0, height, width)
}

/// Crop covering the whole of an already rotated image
pub fn crop_of(image: &GrayImage) -> CropRegion {
    CropRegion::new(0, 0, image.width(), image.height())
}

/// Raw preview frame that rotates into `image`
pub fn frame_showing(image: &GrayImage) -> Frame {
    let (width, height) = (image.height(), image.width());
    let mut data = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(image.get_pixel(height - 1 - y, x)[0]);
        }
    }
    Frame::new(data, width, height)
}

/// Vertical bars, `unit` pixels per module, black on white
pub fn barcode_image(modules: &[bool], unit: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(modules.len() as u32 * unit, height, |x, _| {
        if modules[(x / unit) as usize] {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// QR code for `payload` with a four-module quiet zone
pub fn qr_image(payload: &str, scale: u32) -> GrayImage {
    const QUIET_ZONE: u32 = 4;
    let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * scale;

    GrayImage::from_fn(side, side, |x, y| {
        let module = |m: u32| m.checked_sub(QUIET_ZONE).filter(|&m| m < modules);
        let dark = match (module(x / scale), module(y / scale)) {
            (Some(mx), Some(my)) => colors[(my * modules + mx) as usize] == Color::Dark,
            _ => false,
        };
        if dark {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}
