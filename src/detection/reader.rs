use std::ops::{Deref, DerefMut};
use std::panic::{AssertUnwindSafe, catch_unwind};

use rqrr::PreparedImage;
use tracing::{debug, trace};

use crate::detection::binarize::BinaryBitmap;
use crate::detection::hints::{CodeFormat, RecognitionHints};
use crate::detection::linear;

/// Payload read from a barcode or QR code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCode {
    pub payload: String,
    pub format: CodeFormat,
}

/// Structured-code decoding service.
///
/// The reader is reused across frames and may carry state between calls;
/// `reset` must be called after every `decode` attempt.
pub trait CodeReader: Send {
    /// `Ok(None)` means nothing was found; `Err` is an internal fault.
    fn decode(
        &mut self,
        bitmap: &BinaryBitmap,
        hints: &RecognitionHints,
    ) -> anyhow::Result<Option<DecodedCode>>;

    fn reset(&mut self);
}

/// Resets the wrapped reader when dropped, on every exit path
pub struct ResetGuard<'a, R: CodeReader + ?Sized> {
    reader: &'a mut R,
}

impl<'a, R: CodeReader + ?Sized> ResetGuard<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self { reader }
    }
}

impl<R: CodeReader + ?Sized> Deref for ResetGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.reader
    }
}

impl<R: CodeReader + ?Sized> DerefMut for ResetGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.reader
    }
}

impl<R: CodeReader + ?Sized> Drop for ResetGuard<'_, R> {
    fn drop(&mut self) {
        self.reader.reset();
    }
}

/// Reader that dispatches to every format allowed by the hints.
///
/// The active format set is resolved from the hints on the first attempt after
/// a reset. QR codes go through `rqrr`, Code 39 and Code 128 through the line
/// scanners in [`linear`].
#[derive(Debug, Default)]
pub struct MultiFormatReader {
    active: Option<Vec<CodeFormat>>,
    attempts: u32,
}

impl MultiFormatReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts made since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// No state carried over from a previous attempt
    pub fn is_clean(&self) -> bool {
        self.active.is_none() && self.attempts == 0
    }

    fn resolve_formats(hints: &RecognitionHints) -> Vec<CodeFormat> {
        let formats: Vec<_> = hints.formats().collect();
        trace!(count = formats.len(), "Resolved reader formats");
        formats
    }
}

impl CodeReader for MultiFormatReader {
    fn decode(
        &mut self,
        bitmap: &BinaryBitmap,
        hints: &RecognitionHints,
    ) -> anyhow::Result<Option<DecodedCode>> {
        self.attempts += 1;
        let formats = self
            .active
            .get_or_insert_with(|| Self::resolve_formats(hints))
            .clone();

        for format in formats {
            let payload = match format {
                CodeFormat::QrCode => decode_qr(bitmap, hints.try_harder())?,
                CodeFormat::Code39 | CodeFormat::Code128 => {
                    linear::decode(bitmap, format, hints.try_harder())
                }
            };
            if let Some(payload) = payload.filter(|payload| !payload.is_empty()) {
                return Ok(Some(DecodedCode { payload, format }));
            }
        }

        Ok(None)
    }

    fn reset(&mut self) {
        self.active = None;
        self.attempts = 0;
    }
}

/// Find and decode QR grids. With `try_harder` every detected grid is tried,
/// otherwise only the first.
fn decode_qr(bitmap: &BinaryBitmap, try_harder: bool) -> anyhow::Result<Option<String>> {
    let width = bitmap.width() as usize;
    let height = bitmap.height() as usize;

    // rqrr panics on some degenerate grids
    let decoded = catch_unwind(AssertUnwindSafe(|| {
        let mut prepared =
            PreparedImage::prepare_from_bitmap(width, height, |x, y| bitmap.is_dark(x as u32, y as u32));
        let grids = prepared.detect_grids();
        trace!(count = grids.len(), "QR grids detected");

        let limit = if try_harder { grids.len() } else { 1 };
        for grid in grids.iter().take(limit) {
            match grid.decode() {
                Ok((_, content)) if !content.is_empty() => return Some(content),
                Ok(_) => {}
                Err(e) => debug!(error = ?e, "Failed to decode QR grid"),
            }
        }
        None
    }));

    decoded.map_err(|_| anyhow::anyhow!("QR decoder panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingReader {
        resets: u32,
    }

    impl CodeReader for CountingReader {
        fn decode(
            &mut self,
            _bitmap: &BinaryBitmap,
            _hints: &RecognitionHints,
        ) -> anyhow::Result<Option<DecodedCode>> {
            anyhow::bail!("boom")
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn blank_bitmap() -> BinaryBitmap {
        BinaryBitmap::from_fn(32, 32, |_, _| false)
    }

    #[test]
    fn test_guard_resets_on_error() {
        let mut reader = CountingReader { resets: 0 };
        let result = {
            let mut guard = ResetGuard::new(&mut reader);
            guard.decode(&blank_bitmap(), &RecognitionHints::default())
        };
        assert!(result.is_err());
        assert_eq!(reader.resets, 1);
    }

    #[test]
    fn test_guard_leaves_reader_clean() {
        let mut reader = MultiFormatReader::new();
        {
            let mut guard = ResetGuard::new(&mut reader);
            guard.decode(&blank_bitmap(), &RecognitionHints::default()).unwrap();
            assert_eq!(guard.attempts(), 1);
        }
        assert!(reader.is_clean());
    }

    #[test]
    fn test_blank_bitmap_yields_nothing() {
        let mut reader = MultiFormatReader::new();
        let result = reader.decode(&blank_bitmap(), &RecognitionHints::default()).unwrap();
        assert_eq!(result, None);
        assert_eq!(reader.attempts(), 1);
        assert!(!reader.is_clean());

        reader.reset();
        assert!(reader.is_clean());
    }

    fn code128_bitmap(text: &str) -> BinaryBitmap {
        let modules = linear::code128::encode_modules(text).unwrap();
        BinaryBitmap::from_fn(modules.len() as u32 * 2, 16, |x, _| modules[(x / 2) as usize])
    }

    #[test]
    fn test_decodes_code128() {
        let mut reader = MultiFormatReader::new();
        let result = reader
            .decode(&code128_bitmap("PKG-00417"), &RecognitionHints::default())
            .unwrap();
        assert_eq!(
            result,
            Some(DecodedCode {
                payload: "PKG-00417".to_string(),
                format: CodeFormat::Code128,
            })
        );
    }

    #[test]
    fn test_decodes_code39() {
        let modules = linear::code39::encode_modules("SF1234").unwrap();
        let bitmap =
            BinaryBitmap::from_fn(modules.len() as u32 * 2, 16, |x, _| modules[(x / 2) as usize]);
        let mut reader = MultiFormatReader::new();
        let result = reader
            .decode(&bitmap, &RecognitionHints::new([CodeFormat::Code39]))
            .unwrap();
        assert_eq!(
            result.map(|code| (code.payload, code.format)),
            Some(("SF1234".to_string(), CodeFormat::Code39))
        );
    }

    #[test]
    fn test_formats_outside_hints_are_not_tried() {
        let mut reader = MultiFormatReader::new();
        let hints = RecognitionHints::new([CodeFormat::QrCode, CodeFormat::Code39]);
        let result = reader.decode(&code128_bitmap("PKG-00417"), &hints).unwrap();
        assert_eq!(result, None);
    }
}
