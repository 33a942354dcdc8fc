mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from framescan for tests
pub use framescan::detection::{BinaryBitmap, CodeReader, DecodedCode, TextRecognizer};
pub use framescan::{
    CodeFormat, CropRegion, DecodeMessage, DecodeOutcome, DecodePipeline, Frame, FrameDecoder,
    OutcomeKind, RecognitionHints, WorkerState,
};
