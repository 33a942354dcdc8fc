pub mod detection;
pub mod models;
pub mod pipeline;

pub use models::{CropRegion, DecodeMessage, DecodeOutcome, Frame, FrameError, OutcomeKind};
pub use detection::{CodeFormat, MultiFormatReader, OcrsRecognizer, RecognitionHints};
pub use pipeline::{Command, CropRegionProvider, DecodePipeline, FrameDecoder, WorkerState};
