use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use image::GrayImage;
use tracing::{debug, trace};

use crate::detection::binarize::Binarizer;
use crate::detection::hints::RecognitionHints;
use crate::detection::ocr::TextRecognizer;
use crate::detection::phone::extract_phone_numbers;
use crate::detection::reader::{CodeReader, DecodedCode, ResetGuard};

/// Result of one recognition stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Found(T),
    NotFound,
    /// The underlying service failed internally
    Fault(String),
}

impl<T> StageOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// OCR followed by phone number extraction
pub struct TextRecognitionStage {
    recognizer: Box<dyn TextRecognizer>,
}

impl TextRecognitionStage {
    pub fn new(recognizer: Box<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn name(&self) -> &'static str {
        "Text Recognition"
    }

    /// A panic inside the recognizer is reported as a fault
    pub fn run(&self, image: &GrayImage) -> StageOutcome<String> {
        let recognized = catch_unwind(AssertUnwindSafe(|| self.recognizer.recognize(image)));
        let text = match recognized {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return StageOutcome::Fault(format!("{e:#}")),
            Err(payload) => {
                return StageOutcome::Fault(format!(
                    "OCR engine panicked: {}",
                    panic_message(payload.as_ref())
                ));
            }
        };
        if text.is_empty() {
            trace!("OCR returned no text");
            return StageOutcome::NotFound;
        }

        let numbers = extract_phone_numbers(&text);
        if numbers.is_empty() {
            debug!(chars = text.chars().count(), "OCR text contains no phone number");
            StageOutcome::NotFound
        } else {
            StageOutcome::Found(numbers)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Barcode/QR decoding with adaptive then global-histogram binarization.
///
/// The reader is reset after every attempt, whatever the attempt returned.
pub struct StructuredCodeStage {
    reader: Box<dyn CodeReader>,
    hints: RecognitionHints,
}

impl StructuredCodeStage {
    pub fn new(reader: Box<dyn CodeReader>, hints: RecognitionHints) -> Self {
        Self { reader, hints }
    }

    pub fn name(&self) -> &'static str {
        "Structured Code Recognition"
    }

    pub fn with_hints(mut self, hints: RecognitionHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn hints(&self) -> &RecognitionHints {
        &self.hints
    }

    pub fn run(&mut self, image: &GrayImage) -> StageOutcome<DecodedCode> {
        let mut faults = Vec::new();

        for binarizer in Binarizer::FALLBACK_ORDER {
            let bitmap = binarizer.binarize(image);
            let attempt = {
                let mut reader = ResetGuard::new(self.reader.as_mut());
                reader.decode(&bitmap, &self.hints)
            };

            match attempt {
                Ok(Some(code)) if !code.payload.is_empty() => {
                    trace!(binarizer = binarizer.name(), format = code.format.name(), "Code decoded");
                    return StageOutcome::Found(code);
                }
                Ok(_) => trace!(binarizer = binarizer.name(), "No code found"),
                Err(e) => faults.push(format!("{}: {e:#}", binarizer.name())),
            }
        }

        if faults.is_empty() {
            StageOutcome::NotFound
        } else {
            StageOutcome::Fault(faults.join("; "))
        }
    }
}
