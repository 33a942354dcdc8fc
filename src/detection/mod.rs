//! Leaf stages of the frame decoder: rotation, cropping, binarization and the
//! two recognition stages built on them.

pub mod binarize;
pub mod hints;
pub mod linear;
pub mod luminance;
pub mod ocr;
pub mod phone;
pub mod reader;
pub mod rotation;
pub mod stages;

pub use binarize::{Binarizer, BinaryBitmap};
pub use hints::{CharacterSet, CodeFormat, RecognitionHints};
pub use luminance::{LuminanceError, LuminanceSource};
pub use ocr::{OcrModelPaths, OcrsRecognizer, TextRecognizer};
pub use phone::extract_phone_numbers;
pub use reader::{CodeReader, DecodedCode, MultiFormatReader, ResetGuard};
pub use rotation::{FrameRotator, RotatedFrame};
pub use stages::{StageOutcome, StructuredCodeStage, TextRecognitionStage};
