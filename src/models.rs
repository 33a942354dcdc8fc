use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions {width}x{height} overflow the address space")]
    DimensionOverflow { width: u32, height: u32 },
}

/// Raw luminance plane of a camera preview frame, row-major.
///
/// The buffer may be shorter than `width * height`; missing pixels read as zero
/// after rotation.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// Number of pixels the frame claims to cover
    pub fn pixel_count(&self) -> Result<usize, FrameError> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or(FrameError::DimensionOverflow {
                width: self.width,
                height: self.height,
            })
    }
}

/// Rectangle in rotated-frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> u64 {
        self.left as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.top as u64 + self.height as u64
    }

    /// Whether the region lies fully inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= width as u64
            && self.bottom() <= height as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    PhoneNumber,
    StructuredCode,
}

impl OutcomeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PhoneNumber => "phone",
            Self::StructuredCode => "code",
        }
    }
}

/// Result of decoding one frame
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// Comma-separated phone numbers found by text recognition
    PhoneNumber { text: String, image: GrayImage },
    /// Payload of a barcode or QR code
    StructuredCode { payload: String, image: GrayImage },
    NoResult,
}

impl DecodeOutcome {
    pub fn kind(&self) -> Option<OutcomeKind> {
        match self {
            Self::PhoneNumber { .. } => Some(OutcomeKind::PhoneNumber),
            Self::StructuredCode { .. } => Some(OutcomeKind::StructuredCode),
            Self::NoResult => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind().map(|k| k.tag()).unwrap_or("none")
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::NoResult)
    }

    /// Rendered grayscale image used for recognition, if any
    pub fn image(&self) -> Option<&GrayImage> {
        match self {
            Self::PhoneNumber { image, .. } | Self::StructuredCode { image, .. } => Some(image),
            Self::NoResult => None,
        }
    }

    /// Convert to the message delivered to the consumer
    pub fn into_message(self) -> DecodeMessage {
        match self {
            Self::PhoneNumber { text, image } => DecodeMessage::Succeeded {
                kind: OutcomeKind::PhoneNumber,
                text,
                image,
            },
            Self::StructuredCode { payload, image } => DecodeMessage::Succeeded {
                kind: OutcomeKind::StructuredCode,
                text: payload,
                image,
            },
            Self::NoResult => DecodeMessage::Failed,
        }
    }
}

/// Message sent to the result consumer, exactly one per accepted frame
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeMessage {
    Succeeded {
        kind: OutcomeKind,
        text: String,
        image: GrayImage,
    },
    Failed,
}

impl DecodeMessage {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Succeeded { text, .. } => Some(text.as_str()),
            Self::Failed => None,
        }
    }

    pub fn kind(&self) -> Option<OutcomeKind> {
        match self {
            Self::Succeeded { kind, .. } => Some(*kind),
            Self::Failed => None,
        }
    }
}
