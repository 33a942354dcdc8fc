use crate::models::{Frame, FrameError};

/// Rotates preview frames by 90 degrees into a reused scratch buffer.
///
/// The buffer only grows. It is zero-filled before every rotation so bytes from
/// a larger earlier frame never show through a smaller one.
#[derive(Debug, Default)]
pub struct FrameRotator {
    buffer: Vec<u8>,
}

/// Rotated view borrowed from the rotator's scratch buffer
#[derive(Debug, Clone, Copy)]
pub struct RotatedFrame<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
}

impl FrameRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scratch capacity in bytes
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Rotate `frame` so the output is `height` wide and `width` tall.
    ///
    /// Source offset `x + y * width` lands at `x * height + height - y - 1`.
    /// Source offsets past the end of `frame.data` are skipped.
    pub fn rotate(&mut self, frame: &Frame) -> Result<RotatedFrame<'_>, FrameError> {
        let len = frame.pixel_count()?;
        if self.buffer.len() < len {
            self.buffer.resize(len, 0);
        }
        self.buffer.fill(0);

        let width = frame.width as usize;
        let height = frame.height as usize;
        let covered = frame.data.len().min(len);

        for y in 0..height {
            let row = y * width;
            if row >= covered {
                break;
            }
            let row_end = (row + width).min(covered);
            for (x, &value) in frame.data[row..row_end].iter().enumerate() {
                self.buffer[x * height + height - y - 1] = value;
            }
        }

        Ok(RotatedFrame {
            data: &self.buffer[..len],
            width: frame.height,
            height: frame.width,
        })
    }
}
