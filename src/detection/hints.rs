use std::collections::BTreeSet;

/// Symbologies the structured-code reader may report.
///
/// Declaration order is the order formats are tried in: QR and Code 128 carry
/// check data, Code 39 does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CodeFormat {
    QrCode,
    Code128,
    Code39,
}

impl CodeFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Code39 => "CODE_39",
            Self::Code128 => "CODE_128",
            Self::QrCode => "QR_CODE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Utf8,
}

/// Hint bundle handed to every structured-code decode attempt.
///
/// Built once per pipeline and never mutated; a different format set needs a
/// new pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionHints {
    character_set: CharacterSet,
    try_harder: bool,
    formats: BTreeSet<CodeFormat>,
}

impl RecognitionHints {
    pub fn new(formats: impl IntoIterator<Item = CodeFormat>) -> Self {
        Self {
            character_set: CharacterSet::Utf8,
            try_harder: true,
            formats: formats.into_iter().collect(),
        }
    }

    pub fn character_set(&self) -> CharacterSet {
        self.character_set
    }

    pub fn try_harder(&self) -> bool {
        self.try_harder
    }

    pub fn formats(&self) -> impl Iterator<Item = CodeFormat> + '_ {
        self.formats.iter().copied()
    }

    pub fn accepts(&self, format: CodeFormat) -> bool {
        self.formats.contains(&format)
    }
}

impl Default for RecognitionHints {
    /// Code 39 and Code 128 (common on parcel labels) plus QR
    fn default() -> Self {
        Self::new([CodeFormat::Code39, CodeFormat::Code128, CodeFormat::QrCode])
    }
}
