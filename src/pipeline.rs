use anyhow::Result;
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, trace, warn};

use crate::detection::hints::RecognitionHints;
use crate::detection::luminance::LuminanceSource;
use crate::detection::ocr::TextRecognizer;
use crate::detection::reader::CodeReader;
use crate::detection::rotation::FrameRotator;
use crate::detection::stages::{StageOutcome, StructuredCodeStage, TextRecognitionStage};
use crate::models::{CropRegion, DecodeMessage, DecodeOutcome, Frame, OutcomeKind};

/// Supplies the viewfinder rectangle, in rotated-frame coordinates.
///
/// Queried once per frame. `None` means no rectangle is available yet.
pub trait CropRegionProvider: Send {
    fn crop_region(&self) -> Option<CropRegion>;
}

impl<F> CropRegionProvider for F
where
    F: Fn() -> Option<CropRegion> + Send,
{
    fn crop_region(&self) -> Option<CropRegion> {
        self()
    }
}

/// Decodes one frame at a time: rotate, crop, OCR for phone numbers, then
/// barcode/QR decoding as a fallback.
///
/// Owns the rotation scratch buffer and the reusable code reader, so it must
/// only ever be driven from one thread.
pub struct FrameDecoder {
    rotator: FrameRotator,
    crop: Box<dyn CropRegionProvider>,
    text: Option<TextRecognitionStage>,
    structured: StructuredCodeStage,
    /// Receives one image per decoded frame when set
    debug_dir: Option<PathBuf>,
    frames: u64,
}

impl FrameDecoder {
    /// Decoder with structured-code recognition only and the default hints
    pub fn new(crop: Box<dyn CropRegionProvider>, reader: Box<dyn CodeReader>) -> Self {
        Self {
            rotator: FrameRotator::new(),
            crop,
            text: None,
            structured: StructuredCodeStage::new(reader, RecognitionHints::default()),
            debug_dir: None,
            frames: 0,
        }
    }

    /// Enable phone number recognition with the given OCR service
    pub fn with_text_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.text = Some(TextRecognitionStage::new(recognizer));
        self
    }

    /// Replace the hint bundle used for every structured-code attempt
    pub fn with_hints(mut self, hints: RecognitionHints) -> Self {
        self.structured = self.structured.with_hints(hints);
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug_dir = Some(output_dir);
        Ok(self)
    }

    /// Debug output directory, if debug mode is on
    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug_dir.as_deref()
    }

    pub fn hints(&self) -> &RecognitionHints {
        self.structured.hints()
    }

    /// Number of frames decoded so far
    pub fn frames_decoded(&self) -> u64 {
        self.frames
    }

    /// Decode a single frame. Always produces exactly one outcome.
    pub fn decode(&mut self, frame: &Frame) -> DecodeOutcome {
        let start = Instant::now();
        self.frames += 1;

        let image = {
            let rotated = match self.rotator.rotate(frame) {
                Ok(rotated) => rotated,
                Err(e) => {
                    warn!(error = %e, "Rejecting frame");
                    return DecodeOutcome::NoResult;
                }
            };

            let Some(crop) = self.crop.crop_region() else {
                debug!("No crop region available, skipping frame");
                return DecodeOutcome::NoResult;
            };

            match LuminanceSource::new(rotated, crop) {
                Ok(source) => source.render_cropped_greyscale(),
                Err(e) => {
                    warn!(error = %e, "Cannot build luminance source");
                    return DecodeOutcome::NoResult;
                }
            }
        };

        let recognized = self.recognize(&image);
        self.save_debug_output(&image, recognized.as_ref().map(|(kind, _)| kind.tag()).unwrap_or("none"));

        let outcome = match recognized {
            Some((OutcomeKind::PhoneNumber, text)) => DecodeOutcome::PhoneNumber { text, image },
            Some((OutcomeKind::StructuredCode, payload)) => {
                DecodeOutcome::StructuredCode { payload, image }
            }
            None => DecodeOutcome::NoResult,
        };

        trace!(
            frame = self.frames,
            outcome = outcome.tag(),
            decode_ms = start.elapsed().as_millis(),
            "Frame decoded"
        );
        outcome
    }

    fn recognize(&mut self, image: &GrayImage) -> Option<(OutcomeKind, String)> {
        if let Some(stage) = &self.text {
            if let Some(numbers) = found(stage.name(), stage.run(image)) {
                return Some((OutcomeKind::PhoneNumber, numbers));
            }
        }

        found(self.structured.name(), self.structured.run(image))
            .map(|code| (OutcomeKind::StructuredCode, code.payload))
    }

    fn save_debug_output(&self, image: &GrayImage, tag: &str) {
        let Some(output_dir) = &self.debug_dir else {
            return;
        };

        let filename = format!("{:04}_{}.png", self.frames, tag);
        let output_path = output_dir.join(&filename);
        match image.save(&output_path) {
            Ok(()) => debug!(file = %filename, "Saved debug image"),
            Err(e) => warn!(error = %e, path = %output_path.display(), "Failed to save debug image"),
        }
    }
}

/// Fold a stage outcome into an optional value; faults count as misses
fn found<T>(stage: &str, outcome: StageOutcome<T>) -> Option<T> {
    match outcome {
        StageOutcome::Found(value) => Some(value),
        StageOutcome::NotFound => {
            trace!(stage, "Nothing recognized");
            None
        }
        StageOutcome::Fault(detail) => {
            warn!(stage, detail = %detail, "Recognition service fault, treating as no result");
            None
        }
    }
}

/// Commands accepted by the decode worker
#[derive(Debug)]
pub enum Command {
    Decode(Frame),
    /// Stop after the frame in progress, dropping anything queued behind it
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Decoding,
    Dispatched,
    Terminated,
}

struct Worker {
    decoder: FrameDecoder,
    commands: Receiver<Command>,
    outcomes: UnboundedSender<DecodeMessage>,
    state: WorkerState,
}

impl Worker {
    fn transition(&mut self, next: WorkerState) {
        trace!(from = ?self.state, to = ?next, "Worker state change");
        self.state = next;
    }

    fn run(mut self) -> WorkerState {
        while let Ok(command) = self.commands.recv() {
            match command {
                Command::Decode(frame) => {
                    self.transition(WorkerState::Decoding);
                    let message = self.decoder.decode(&frame).into_message();
                    drop(frame);

                    self.transition(WorkerState::Dispatched);
                    if self.outcomes.send(message).is_err() {
                        debug!("Outcome receiver dropped, discarding result");
                    }
                    self.transition(WorkerState::Idle);
                }
                Command::Terminate => {
                    self.transition(WorkerState::Terminated);
                    break;
                }
            }
        }

        debug!(state = ?self.state, frames = self.decoder.frames_decoded(), "Decode worker stopped");
        self.state
    }
}

/// Handle to a dedicated decode worker thread.
///
/// Frames queue without bound; callers needing bounded memory must limit
/// submissions themselves. Dropping the handle asks the worker to terminate.
pub struct DecodePipeline {
    commands: Sender<Command>,
    worker: Option<JoinHandle<WorkerState>>,
}

impl DecodePipeline {
    /// Start the worker. Returns the handle and the outcome receiver; exactly one
    /// message arrives per accepted frame.
    pub fn spawn(decoder: FrameDecoder) -> Result<(Self, UnboundedReceiver<DecodeMessage>)> {
        let (command_tx, command_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = unbounded_channel();

        let worker = Worker {
            decoder,
            commands: command_rx,
            outcomes: outcome_tx,
            state: WorkerState::Idle,
        };
        let handle = std::thread::Builder::new()
            .name("frame-decode".to_string())
            .spawn(move || worker.run())?;

        Ok((
            Self {
                commands: command_tx,
                worker: Some(handle),
            },
            outcome_rx,
        ))
    }

    /// Queue a frame for decoding
    pub fn submit(&self, frame: Frame) -> Result<()> {
        self.send(Command::Decode(frame))
    }

    /// Ask the worker to stop once the current frame is done
    pub fn terminate(&self) -> Result<()> {
        self.send(Command::Terminate)
    }

    /// Sender for producers living on other threads
    pub fn command_sender(&self) -> Sender<Command> {
        self.commands.clone()
    }

    /// Terminate and wait for the worker to exit
    pub fn shutdown(mut self) -> Result<WorkerState> {
        // The worker may already be gone
        let _ = self.commands.send(Command::Terminate);
        self.join_worker()
    }

    /// Wait for the worker to exit without asking it to stop
    pub fn join(mut self) -> Result<WorkerState> {
        self.join_worker()
    }

    fn join_worker(&mut self) -> Result<WorkerState> {
        match self.worker.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow::anyhow!("Decode worker panicked")),
            None => Ok(WorkerState::Terminated),
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|e| anyhow::anyhow!("Decode worker is not running: {}", e))
    }
}

impl Drop for DecodePipeline {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.commands.send(Command::Terminate);
        }
    }
}
